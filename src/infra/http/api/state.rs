use crate::application::mediator::Mediator;
use crate::infra::db::DataContext;

#[derive(Clone)]
pub struct ApiState {
    pub mediator: Mediator,
    pub data: DataContext,
}
