use envconfig::Envconfig;

/// Environment variables that must be non-empty for an analysis to succeed.
pub const REQUIRED_VARS: [&str; 3] = ["GITHUB_TOKEN", "GITHUB_REPO", "OPENAI_API_KEY"];

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "LISTEN_ADDRESS", default = "0.0.0.0:8989")]
    pub listen_address: String,

    #[envconfig(from = "GITHUB_TOKEN", default = "")]
    pub github_token: String,

    /// `owner/repository`
    #[envconfig(from = "GITHUB_REPO", default = "")]
    pub github_repo: String,

    #[envconfig(from = "GITHUB_BRANCH", default = "main")]
    pub github_branch: String,

    #[envconfig(from = "GITHUB_PATH_PREFIX", default = "plant-images")]
    pub github_path_prefix: String,

    #[envconfig(from = "GITHUB_API_URL", default = "https://api.github.com")]
    pub github_api_url: String,

    #[envconfig(from = "OPENAI_API_KEY", default = "")]
    pub openai_api_key: String,

    #[envconfig(from = "OPENAI_BASE_URL", default = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[envconfig(from = "OPENAI_MODEL", default = "gpt-4o")]
    pub openai_model: String,
}

impl Config {
    /// Names of the required variables that are unset or empty, in declaration order.
    pub fn missing(&self) -> Vec<&'static str> {
        let values = [
            &self.github_token,
            &self.github_repo,
            &self.openai_api_key,
        ];

        REQUIRED_VARS
            .into_iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&map).unwrap()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.listen_address, "0.0.0.0:8989");
        assert_eq!(config.github_branch, "main");
        assert_eq!(config.github_path_prefix, "plant-images");
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.missing(), REQUIRED_VARS.to_vec());
    }

    #[test]
    fn all_three_present_is_configured() {
        let config = config_from(&[
            ("GITHUB_TOKEN", "ghp_x"),
            ("GITHUB_REPO", "me/leaves"),
            ("OPENAI_API_KEY", "sk-x"),
        ]);
        assert!(config.is_configured());
        assert!(config.missing().is_empty());
    }

    #[test]
    fn reports_the_one_missing_name() {
        let config = config_from(&[("GITHUB_TOKEN", "ghp_x"), ("OPENAI_API_KEY", "sk-x")]);
        assert!(!config.is_configured());
        assert_eq!(config.missing(), vec!["GITHUB_REPO"]);
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let config = config_from(&[
            ("GITHUB_TOKEN", "ghp_x"),
            ("GITHUB_REPO", "me/leaves"),
            ("OPENAI_API_KEY", ""),
        ]);
        assert_eq!(config.missing(), vec!["OPENAI_API_KEY"]);
    }
}
