//! Autograd operations with backward passes

use super::tensor::GradCell;
use super::{BackwardOp, Tensor};
use crate::{Error, Result};
use ndarray::{Array1, ArrayView2};
use std::rc::Rc;

fn recurse(inputs: &[&Tensor]) {
    for input in inputs {
        if let Some(op) = input.backward_op() {
            op.backward();
        }
    }
}

fn view2(t: &Tensor, rows: usize, cols: usize) -> Result<ArrayView2<'_, f32>> {
    t.data()
        .view()
        .into_shape_with_order((rows, cols))
        .map_err(|_| Error::ShapeMismatch {
            expected: vec![rows, cols],
            got: vec![t.len()],
        })
}

/// Element-wise sum of two tensors of equal length
pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    if a.len() != b.len() {
        return Err(Error::ShapeMismatch {
            expected: vec![a.len()],
            got: vec![b.len()],
        });
    }
    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::new(a.data() + b.data(), requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        }));
    }
    Ok(result)
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for AddBackward {
    fn backward(&self) {
        let Some(grad) = self.result_grad.borrow().clone() else {
            return;
        };
        if self.a.requires_grad() {
            self.a.accumulate_grad(grad.clone());
        }
        if self.b.requires_grad() {
            self.b.accumulate_grad(grad);
        }
        recurse(&[&self.a, &self.b]);
    }
}

/// Row-major matrix product `C[m, n] = A[m, k] @ B[k, n]`
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Result<Tensor> {
    let av = view2(a, m, k)?;
    let bv = view2(b, k, n)?;
    let product = av.dot(&bv);
    let data = Array1::from_iter(product.iter().copied());

    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            result_grad: result.grad_cell(),
        }));
    }
    Ok(result)
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    result_grad: GradCell,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        let Some(grad) = self.result_grad.borrow().clone() else {
            return;
        };
        let (Ok(g), Ok(av), Ok(bv)) = (
            grad.view().into_shape_with_order((self.m, self.n)),
            view2(&self.a, self.m, self.k),
            view2(&self.b, self.k, self.n),
        ) else {
            return;
        };

        // dA = dC @ B^T
        if self.a.requires_grad() {
            let grad_a = g.dot(&bv.t());
            self.a
                .accumulate_grad(Array1::from_iter(grad_a.iter().copied()));
        }
        // dB = A^T @ dC
        if self.b.requires_grad() {
            let grad_b = av.t().dot(&g);
            self.b
                .accumulate_grad(Array1::from_iter(grad_b.iter().copied()));
        }
        recurse(&[&self.a, &self.b]);
    }
}

/// Select elements by flat index: `out[i] = a[indices[i]]`.
///
/// Used to re-lay a flat buffer (for example a transpose). The backward pass
/// scatters gradients back to the source positions.
pub fn gather(a: &Tensor, indices: Rc<[usize]>) -> Result<Tensor> {
    if let Some(&bad) = indices.iter().find(|&&i| i >= a.len()) {
        return Err(Error::InvalidParameter(format!(
            "gather index {bad} out of bounds for length {}",
            a.len()
        )));
    }
    let data = Array1::from_iter(indices.iter().map(|&i| a.data()[i]));
    let mut result = Tensor::new(data, a.requires_grad());

    if a.requires_grad() {
        result.set_backward_op(Rc::new(GatherBackward {
            a: a.clone(),
            indices,
            result_grad: result.grad_cell(),
        }));
    }
    Ok(result)
}

struct GatherBackward {
    a: Tensor,
    indices: Rc<[usize]>,
    result_grad: GradCell,
}

impl BackwardOp for GatherBackward {
    fn backward(&self) {
        let Some(grad) = self.result_grad.borrow().clone() else {
            return;
        };
        let mut grad_a = Array1::zeros(self.a.len());
        for (g, &i) in grad.iter().zip(self.indices.iter()) {
            grad_a[i] += g;
        }
        self.a.accumulate_grad(grad_a);
        recurse(&[&self.a]);
    }
}
