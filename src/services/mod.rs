//! Business logic services

pub mod catalog;
pub mod lending;
pub mod members;
pub mod policy;

use std::sync::Arc;

use crate::{clock::Clock, config::LendingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub lending: lending::LendingService,
}

impl Services {
    /// Create all services over one store and one time source
    pub fn new(repository: Repository, lending_config: LendingConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            lending: lending::LendingService::new(repository, lending_config, clock),
        }
    }
}
