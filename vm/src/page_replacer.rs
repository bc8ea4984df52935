use std::str::FromStr;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::VmError;

pub enum FrameEvent {
    /// O frame acabou de receber uma página nova (não vale para upgrade de
    /// permissão).
    Filled(usize),
}

/// Estratégia de escolha do frame alvo num page fault de página inválida.
///
/// O replacer só escolhe um número de frame; quem decide se há vítima a
/// remover é o resolver.
pub trait PageReplacer {
    fn frame_event(&mut self, _event: FrameEvent) {}

    fn pick_victim_frame(&mut self, frame_count: usize) -> usize;
}

impl<R: PageReplacer + ?Sized> PageReplacer for Box<R> {
    fn frame_event(&mut self, event: FrameEvent) {
        (**self).frame_event(event)
    }

    fn pick_victim_frame(&mut self, frame_count: usize) -> usize {
        (**self).pick_victim_frame(frame_count)
    }
}

/// Sorteia uniformemente em `[0, frame_count)`.
pub struct RandomPageReplacer<R: Rng = ChaCha8Rng> {
    rng: R,
}

impl RandomPageReplacer {
    pub fn seeded(seed: u64) -> Self {
        RandomPageReplacer::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        RandomPageReplacer::seeded(rand::random())
    }
}

impl<R: Rng> RandomPageReplacer<R> {
    pub fn with_rng(rng: R) -> Self {
        RandomPageReplacer { rng }
    }
}

impl<R: Rng> PageReplacer for RandomPageReplacer<R> {
    fn pick_victim_frame(&mut self, frame_count: usize) -> usize {
        self.rng.random_range(0..frame_count)
    }
}

/// Percorre os frames em ordem circular. O cursor só anda quando um frame é
/// de fato preenchido.
pub struct FIFOPageReplacer {
    cursor: usize,
}

impl FIFOPageReplacer {
    pub fn new() -> Self {
        FIFOPageReplacer { cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Default for FIFOPageReplacer {
    fn default() -> Self {
        FIFOPageReplacer::new()
    }
}

impl PageReplacer for FIFOPageReplacer {
    fn frame_event(&mut self, event: FrameEvent) {
        let FrameEvent::Filled(frame_idx) = event;

        self.cursor = frame_idx + 1;

        debug!("fifo: frame {} preenchido, cursor={}", frame_idx, self.cursor);
    }

    fn pick_victim_frame(&mut self, frame_count: usize) -> usize {
        if self.cursor >= frame_count {
            self.cursor = 0;
        }

        self.cursor
    }
}

/// Política escolhida na linha de comando.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplacementPolicy {
    Random,
    Fifo,
}

impl ReplacementPolicy {
    /// `seed` só é usada pela política aleatória; sem ela, a semente vem do
    /// sistema.
    pub fn build(self, seed: Option<u64>) -> Box<dyn PageReplacer> {
        match self {
            ReplacementPolicy::Random => match seed {
                Some(seed) => Box::new(RandomPageReplacer::seeded(seed)),
                None => Box::new(RandomPageReplacer::from_entropy()),
            },
            ReplacementPolicy::Fifo => Box::new(FIFOPageReplacer::new()),
        }
    }
}

impl FromStr for ReplacementPolicy {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rand" => Ok(ReplacementPolicy::Random),
            "fifo" => Ok(ReplacementPolicy::Fifo),
            other => Err(VmError::UnknownPolicy(other.to_string())),
        }
    }
}
