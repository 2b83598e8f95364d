use std::sync::Arc;

use crate::config::{PlexApiBuilder, SdkConfiguration};
use crate::home_users::HomeUsers;

/// Entry point of the SDK. Cloning is cheap; clones share configuration,
/// transport and hooks.
#[derive(Clone, Debug)]
pub struct PlexApi {
    configuration: Arc<SdkConfiguration>,
}

impl PlexApi {
    pub fn builder() -> PlexApiBuilder {
        PlexApiBuilder::new()
    }

    pub(crate) fn from_configuration(configuration: SdkConfiguration) -> Self {
        Self {
            configuration: Arc::new(configuration),
        }
    }

    pub fn configuration(&self) -> &SdkConfiguration {
        &self.configuration
    }

    /// Operations on the users of a Plex Home.
    pub fn home_users(&self) -> HomeUsers {
        HomeUsers::new(self.clone())
    }
}
