use thiserror::Error;

use crate::model::NodeId;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("No hay grafo para descargar")]
    NothingRendered,

    #[error("Nodo desconocido: {0}")]
    UnknownNode(NodeId),
}

pub type Result<T> = std::result::Result<T, GraphError>;
