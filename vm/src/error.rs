use thiserror::Error;

pub type Result<T> = std::result::Result<T, VmError>;

/// Erros do simulador. Nenhum deles é recuperável localmente: quem recebe
/// um `VmError` deve abortar a simulação.
#[derive(Error, Debug)]
pub enum VmError {
    /// Índice de página, frame ou endereço fora dos limites configurados.
    #[error("{what} {index} out of range (limit {bound})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("Algorithm not found: {0}")]
    UnknownPolicy(String),

    #[error("unknown program: {0}")]
    UnknownProgram(String),

    /// Page table e frame table discordam, ou uma página já gravável
    /// gerou fault. Sempre indica bug no resolver.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("invalid geometry: {npages} pages, {nframes} frames")]
    InvalidGeometry { npages: usize, nframes: usize },

    #[error("storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),
}

impl VmError {
    pub(crate) fn out_of_range(what: &'static str, index: usize, bound: usize) -> Self {
        VmError::OutOfRange { what, index, bound }
    }
}
