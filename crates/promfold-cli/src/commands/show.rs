use std::path::Path;

use clap::ValueEnum;
use promfold_core::{MetricFamily, encode_pretty};
use promfold_store::load_state;

use crate::config::{Config, Overrides};

/// Output format for `promfold show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Summary,
    Json,
}

pub fn show(config: Option<&Path>, state: Option<&Path>, format: ShowFormat) -> anyhow::Result<()> {
    let config = Config::load(config)?;
    let path = config.state_file(&Overrides {
        state_file: state.map(Path::to_path_buf),
        ..Overrides::default()
    })?;
    let families = load_state(&path)?;

    match format {
        ShowFormat::Json => {
            println!("{}", String::from_utf8_lossy(&encode_pretty(&families)?));
        }
        ShowFormat::Summary => {
            print!("{}", format_summary(&families));
        }
    }
    Ok(())
}

/// One header line per family followed by its samples.
pub fn format_summary(families: &[MetricFamily]) -> String {
    if families.is_empty() {
        return "(no metric families)\n".to_string();
    }

    let mut out = String::new();
    for family in families {
        let title = if family.has_label_names() {
            family.key().to_string()
        } else {
            family.name.clone()
        };
        out.push_str(&format!(
            "{} [{}] {} sample(s)\n",
            title,
            family.kind,
            family.samples.len()
        ));
        for sample in &family.samples {
            let labels: Vec<String> = sample
                .label_names
                .iter()
                .zip(&sample.label_values)
                .map(|(name, value)| format!("{name}={value:?}"))
                .collect();
            if labels.is_empty() {
                out.push_str(&format!("  {} {}\n", sample.name, sample.value));
            } else {
                out.push_str(&format!(
                    "  {}{{{}}} {}\n",
                    sample.name,
                    labels.join(","),
                    sample.value
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use promfold_core::Sample;

    #[test]
    fn summary_of_empty_state() {
        assert_eq!(format_summary(&[]), "(no metric families)\n");
    }

    #[test]
    fn summary_lists_samples() {
        let families = vec![MetricFamily {
            name: "http_requests".to_string(),
            kind: "counter".to_string(),
            help: "Requests.".to_string(),
            label_names: vec!["method".to_string(), "code".to_string()],
            samples: vec![Sample::new(
                "http_requests",
                vec!["method".to_string(), "code".to_string()],
                vec!["GET".to_string(), "200".to_string()],
                5.0,
            )],
        }];

        let out = format_summary(&families);
        assert!(out.starts_with("http_requests{code,method} [counter] 1 sample(s)\n"), "{out}");
        assert!(out.contains("  http_requests{method=\"GET\",code=\"200\"} 5\n"), "{out}");
    }

    #[test]
    fn summary_omits_braces_for_unlabelled_family() {
        let families = vec![MetricFamily {
            name: "up".to_string(),
            kind: "gauge".to_string(),
            help: String::new(),
            label_names: vec![],
            samples: vec![Sample::new("up", vec![], vec![], 1.0)],
        }];

        let out = format_summary(&families);
        assert_eq!(out, "up [gauge] 1 sample(s)\n  up 1\n");
    }
}
