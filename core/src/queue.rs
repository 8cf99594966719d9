use alloc::collections::VecDeque;
use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::*;

/// Lookahead length used when no setting overrides it.
pub const DEFAULT_QUEUE_LENGTH: usize = 5;

/// Upcoming pipes, head first. Always holds exactly `length` pipes between
/// operations.
#[derive(Clone, Debug)]
pub struct PipeQueue {
    pipes: VecDeque<Pipe>,
    length: usize,
    rng: SmallRng,
}

impl PipeQueue {
    /// A queue filled entirely with generated pipes.
    pub fn new(length: usize, seed: u64) -> Self {
        Self::with_pipes(length, seed, [])
    }

    /// A queue seeded with `initial` pipes, padded with generated ones up to
    /// `length`.
    pub fn with_pipes(length: usize, seed: u64, initial: impl IntoIterator<Item = Pipe>) -> Self {
        let length = if length == 0 {
            log::warn!("Queue length must be positive, using 1");
            1
        } else {
            length
        };

        let mut pipes: VecDeque<_> = initial
            .into_iter()
            .map(|pipe| Pipe::new(pipe.shape()))
            .collect();
        if pipes.len() > length {
            log::warn!(
                "Dropping {} initial pipes that do not fit a queue of {}",
                pipes.len() - length,
                length
            );
            pipes.truncate(length);
        }

        let mut queue = Self {
            pipes,
            length,
            rng: SmallRng::seed_from_u64(seed),
        };
        while queue.pipes.len() < length {
            let pipe = queue.generate();
            queue.pipes.push_back(pipe);
        }
        queue
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// Number of pipes the queue is kept at.
    pub fn capacity(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn peek(&self) -> Pipe {
        self.pipes[0]
    }

    /// Takes the head and appends a freshly generated pipe.
    pub fn consume(&mut self) -> Pipe {
        let head = self.pipes.pop_front().unwrap_or_else(|| self.generate());
        let next = self.generate();
        self.pipes.push_back(next);
        debug_assert_eq!(self.pipes.len(), self.length);
        log::trace!("Consumed {:?}, generated {:?}", head.shape(), next.shape());
        head
    }

    /// Reverses one `consume`: `pipe` goes back to the head and the newest tail
    /// pipe is discarded.
    pub fn undo(&mut self, pipe: Pipe) {
        self.pipes.push_front(Pipe::new(pipe.shape()));
        self.pipes.truncate(self.length);
    }

    pub fn iter(&self) -> impl Iterator<Item = Pipe> + '_ {
        self.pipes.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Pipe> {
        self.iter().collect()
    }

    fn generate(&mut self) -> Pipe {
        let index = self.rng.random_range(0..PipeShape::ALL.len());
        Pipe::new(PipeShape::ALL[index])
    }
}
