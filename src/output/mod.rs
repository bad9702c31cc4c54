// src/output/mod.rs
//! Rendering of discovery and check results for the host.

use std::str::FromStr;

use crate::check::{CheckResult, Metric, Service};

/// The supported output formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// Classic plugin output: `STATE - summary | perfdata`.
    Text,

    /// A JSON document.
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            _ => Err(format!("unrecognised format: {}", input)),
        }
    }
}

/// Render a check result.
///
/// In text format a metric is appended as performance data, e.g.
/// `OK - Backlog count: 10 | count=10;300;1000`.
///
/// # Errors
///
/// Propagates any serialization error in JSON format.
pub fn check_result(result: &CheckResult, format: Format) -> serde_json::Result<String> {
    match format {
        Format::Text => {
            let mut output = format!("{} - {}", result.state, result.summary);
            if let Some(metric) = &result.metric {
                output.push_str(" | ");
                output.push_str(&perfdata(metric));
            }
            Ok(output)
        }
        Format::Json => serde_json::to_string(result),
    }
}

/// Render discovered services, named using `template`.
///
/// Text format prints one service name per line.
///
/// # Errors
///
/// Propagates any serialization error in JSON format.
pub fn services(
    services: &[Service],
    template: &str,
    format: Format,
) -> serde_json::Result<String> {
    match format {
        Format::Text => Ok(services
            .iter()
            .map(|service| service.name(template))
            .collect::<Vec<_>>()
            .join("\n")),
        Format::Json => {
            let services: Vec<_> = services
                .iter()
                .map(|service| {
                    serde_json::json!({
                        "item": service.item,
                        "name": service.name(template),
                    })
                })
                .collect();
            serde_json::to_string(&services)
        }
    }
}

fn perfdata(metric: &Metric) -> String {
    match &metric.levels {
        Some(levels) => format!(
            "{}={};{};{}",
            metric.name, metric.value, levels.warn, levels.crit
        ),
        None => format!("{}={}", metric.name, metric.value),
    }
}

#[cfg(test)]
mod tests {
    use crate::check::{check, discover};
    use crate::test::{self, section};

    use super::{check_result, services, Format};

    #[test]
    fn parse_format() {
        assert_eq!("text".parse(), Ok(Format::Text));
        assert_eq!("json".parse(), Ok(Format::Json));
        assert_eq!(
            "yaml".parse::<Format>(),
            Err("unrecognised format: yaml".to_string())
        );
    }

    #[test]
    fn text_check_result() -> test::Result {
        let section = section();

        let result = check("Archive to foohost", &section)?;
        assert_eq!(
            check_result(&result, Format::Text)?,
            "WARN - Backlog count: 875 | count=875;300;1000"
        );

        let result = check("WannaCryExampleData from foohost", &section)?;
        assert_eq!(check_result(&result, Format::Text)?, "OK - DFSR Disabled");

        let result = check("nope", &section)?;
        assert_eq!(
            check_result(&result, Format::Text)?,
            "UNKNOWN - item not found"
        );

        Ok(())
    }

    #[test]
    fn json_check_result() -> test::Result {
        let result = check("FOO_DATA from foohost", &section())?;
        let json: serde_json::Value = serde_json::from_str(&check_result(&result, Format::Json)?)?;

        assert_eq!(
            json,
            serde_json::json!({
                "state": "OK",
                "summary": "Backlog count: 10",
                "metric": {
                    "name": "count",
                    "value": 10.0,
                    "levels": { "warn": 300.0, "crit": 1000.0 },
                },
            })
        );

        Ok(())
    }

    #[test]
    fn text_services() -> test::Result {
        let section = section();
        let output = services(&discover(&section[..2]), crate::SERVICE_NAME, Format::Text)?;
        assert_eq!(
            output,
            "DFS Backlog: FOO_DATA from foohost\nDFS Backlog: FOO_DATA to foohost"
        );
        Ok(())
    }

    #[test]
    fn json_services() -> test::Result {
        let section = section();
        let output = services(&discover(&section[..1]), crate::SERVICE_NAME, Format::Json)?;
        let json: serde_json::Value = serde_json::from_str(&output)?;
        assert_eq!(
            json,
            serde_json::json!([{
                "item": "FOO_DATA from foohost",
                "name": "DFS Backlog: FOO_DATA from foohost",
            }])
        );
        Ok(())
    }
}
