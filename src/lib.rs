pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{api_service::ApiClient, feed_service::VacancyFeed};
use crate::utils::launch_params::LaunchParams;

/// Everything the mini app needs, wired from one explicit configuration.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub launch_params: LaunchParams,
    pub api: ApiClient,
    pub feed: VacancyFeed,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let launch_params = LaunchParams::from_config(&config)?;
        Self::with_launch_params(config, launch_params)
    }

    pub fn with_launch_params(config: Config, launch_params: LaunchParams) -> Result<Self> {
        let api = ApiClient::new(&config, &launch_params)?;
        let feed = VacancyFeed::new(api.clone(), &config);

        Ok(Self {
            config,
            launch_params,
            api,
            feed,
        })
    }
}
