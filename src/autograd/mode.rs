//! Execution mode passed explicitly to forward computations

/// Whether a forward pass records a graph for backpropagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Parameters participate in the graph and receive gradients
    #[default]
    Train,
    /// Forward pass over detached parameters; no graph is built
    Eval,
}

impl Mode {
    /// Check if in training mode
    pub fn is_training(self) -> bool {
        matches!(self, Mode::Train)
    }

    /// Detach a tensor for this mode.
    ///
    /// In eval mode the returned tensor shares no gradient cell with the input
    /// and never requires grad, so nothing downstream records backward ops.
    pub fn prepare(self, param: &super::Tensor) -> super::Tensor {
        match self {
            Mode::Train => param.clone(),
            Mode::Eval => super::Tensor::new(param.data().clone(), false),
        }
    }
}
