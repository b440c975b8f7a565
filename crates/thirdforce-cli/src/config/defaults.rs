pub struct DefaultsConfig {
    pub prefix: String,
    pub model: String,
    pub device: String,
    pub working_dir: String,
    pub evaluator_kind: String,
    pub args: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            prefix: "3RD".to_string(),
            model: "mace-mpa-0-medium.model".to_string(),
            device: "cpu".to_string(),
            working_dir: ".".to_string(),
            evaluator_kind: "external".to_string(),
            args: vec![
                "--model".to_string(),
                "{model}".to_string(),
                "--device".to_string(),
                "{device}".to_string(),
            ],
        }
    }
}
