use crate::core::config::data::{Config, DEFAULT_BASE_URL};

impl Config {
    pub fn summary_lines(&self) -> Vec<String> {
        fn or_unset(value: Option<&str>) -> &str {
            value.unwrap_or("(unset)")
        }

        let mut lines = vec![
            "Current configuration:".to_string(),
            format!(
                "  base-url: {}",
                self.base_url
                    .as_deref()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("(unset, default {DEFAULT_BASE_URL})"))
            ),
            format!("  login-email: {}", or_unset(self.login_email.as_deref())),
            format!("  greeting: {}", or_unset(self.greeting.as_deref())),
            format!("  log-file: {}", or_unset(self.log_file.as_deref())),
        ];
        if self.agents.is_empty() {
            lines.push("  agents: (built-in roster)".to_string());
        } else {
            lines.push("  agents:".to_string());
            for agent in &self.agents {
                lines.push(format!("    {}: {}", agent.id, agent.name));
            }
        }
        lines
    }

    pub fn print_all(&self) {
        for line in self.summary_lines() {
            println!("{line}");
        }
    }
}
