//! Backward operation trait

/// A recorded op that pushes its output gradient into its inputs.
///
/// Implementations read the gradient cell of the tensor they produced, add
/// the input gradients, then recurse into the inputs' own ops.
pub trait BackwardOp {
    fn backward(&self);
}
