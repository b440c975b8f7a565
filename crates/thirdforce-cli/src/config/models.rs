use thirdforce::engine::config::RunConfig;

pub struct AppConfig {
    pub core_config: RunConfig,
    pub show_progress: bool,
}
