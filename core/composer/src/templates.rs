use predictive_ingestion::{AppConfig, ExportReport};
use predictive_schemas::Suggestion;

/// How much of a suggestion list to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// Comma-separated on one line
    Short,
    /// One suggestion per line
    #[default]
    Standard,
    /// Grouped by origin, with priorities
    Detailed,
}

/// Plain-text renderer for command output
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_suggestions(&self, style: ListStyle, tag: &str, suggestions: &[Suggestion]) -> String {
        if suggestions.is_empty() {
            return format!("No suggestions for '{}'.", tag);
        }

        match style {
            ListStyle::Short => self.render_short(suggestions),
            ListStyle::Standard => self.render_standard(suggestions),
            ListStyle::Detailed => self.render_detailed(tag, suggestions),
        }
    }

    fn render_short(&self, suggestions: &[Suggestion]) -> String {
        suggestions
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_standard(&self, suggestions: &[Suggestion]) -> String {
        suggestions
            .iter()
            .map(|s| {
                if s.promoted {
                    format!("* {}", s.text)
                } else {
                    format!("  {}", s.text)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_detailed(&self, tag: &str, suggestions: &[Suggestion]) -> String {
        let mut lines = vec![format!("Suggestions for '{}':", tag)];

        let (promoted, historical): (Vec<&Suggestion>, Vec<&Suggestion>) =
            suggestions.iter().partition(|s| s.promoted);

        if !promoted.is_empty() {
            lines.push("\nLearned:".to_string());
            for s in promoted {
                lines.push(format!("- {} (priority {})", s.text, s.priority));
            }
        }

        if !historical.is_empty() {
            lines.push("\nFrom history:".to_string());
            for s in historical {
                lines.push(format!("- {}", s.text));
            }
        }

        lines.join("\n")
    }

    pub fn render_export(&self, report: &ExportReport) -> String {
        let mut lines = vec![report.text.clone()];
        if !report.flagged.is_empty() {
            lines.push(format!("Notify-listed tags: {}", report.flagged.join(", ")));
        }
        if report.added {
            lines.push("Saved new tagset.".to_string());
        }
        lines.join("\n")
    }

    pub fn render_config(&self, config: &AppConfig) -> String {
        let mut lines = vec![
            format!(
                "Spellchecker: {}",
                config.spellchecker.as_deref().unwrap_or("(none)")
            ),
            format!("Max tags: {}", config.max_tags),
        ];

        let presets = config.configured_presets();
        if presets.is_empty() {
            lines.push("Presets: (none configured)".to_string());
        } else {
            lines.push("Presets:".to_string());
            for preset in presets {
                let tags: Vec<&str> = preset
                    .tags
                    .iter()
                    .map(|t| t.as_str())
                    .filter(|t| !t.trim().is_empty())
                    .collect();
                lines.push(format!("- {}: {}", preset.text, tags.join(", ")));
            }
        }

        lines.join("\n")
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictive_ingestion::Preset;
    use predictive_schemas::PriorityBand;

    fn sample() -> Vec<Suggestion> {
        let band = PriorityBand {
            tier: 0,
            tiers: 1,
            priority: 20,
        };
        vec![
            Suggestion::promoted("forest", band),
            Suggestion::historical("bird"),
            Suggestion::historical("wildlife"),
        ]
    }

    #[test]
    fn test_short_template() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render_suggestions(ListStyle::Short, "owl", &sample());
        assert_eq!(result, "forest, bird, wildlife");
    }

    #[test]
    fn test_standard_template_marks_promoted() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render_suggestions(ListStyle::Standard, "owl", &sample());
        assert_eq!(result, "* forest\n  bird\n  wildlife");
    }

    #[test]
    fn test_detailed_template() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render_suggestions(ListStyle::Detailed, "owl", &sample());
        assert!(result.starts_with("Suggestions for 'owl':"));
        assert!(result.contains("- forest (priority 20)"));
        assert!(result.contains("From history:\n- bird\n- wildlife"));
    }

    #[test]
    fn test_empty_list() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render_suggestions(ListStyle::Detailed, "kite", &[]);
        assert_eq!(result, "No suggestions for 'kite'.");
    }

    #[test]
    fn test_config_hides_unconfigured_presets() {
        let config = AppConfig {
            spellchecker: Some("en-US".to_string()),
            presets: vec![
                Preset {
                    text: "Birds".to_string(),
                    tags: vec!["owl".to_string(), "hawk".to_string()],
                },
                Preset::default(),
            ],
            max_tags: 12,
        };

        let result = TemplateRenderer::new().render_config(&config);
        assert!(result.contains("Max tags: 12"));
        assert!(result.contains("- Birds: owl, hawk"));
        assert_eq!(result.matches("\n- ").count(), 1);
    }
}
