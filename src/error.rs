use thiserror::Error;

use crate::tree::ElementId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Event loop error: {0}")]
    Loop(#[from] calloop::Error),
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),
    #[error("Element {0} is not a container")]
    NotAContainer(ElementId),
}

pub type Result<T> = std::result::Result<T, Error>;
