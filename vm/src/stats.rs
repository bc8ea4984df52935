use std::fmt;

/// Contadores da simulação. Só o resolver incrementa.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultStats {
    pub faults: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

impl fmt::Display for FaultStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of page faults: {}", self.faults)?;
        writeln!(f, "Number of disk reads: {}", self.disk_reads)?;
        write!(f, "Number of page writes: {}", self.disk_writes)
    }
}
