use super::activation::Activation;
use crate::core::numeric::Real;
use nalgebra::{DMatrix, DVector};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("A network needs at least one layer")]
    Empty,
    #[error("Layer {layer}: bias has {bias} entries but the weight matrix has {rows} rows")]
    BiasLength {
        layer: usize,
        rows: usize,
        bias: usize,
    },
    #[error("Layer {layer} expects {expected} inputs, but the previous layer produces {found}")]
    LayerShape {
        layer: usize,
        expected: usize,
        found: usize,
    },
    #[error("The final layer must produce a single output, found {0}")]
    OutputDimension(usize),
    #[error("Network expects {expected} input features, got {found}")]
    InputDimension { expected: usize, found: usize },
    #[error("Backward pass requested with a forward state from a different network")]
    StaleForwardPass,
    #[error("Backward seed has {found} entries, expected one per configuration ({expected})")]
    SeedLength { expected: usize, found: usize },
}

/// One affine map followed by an element-wise activation.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T: Real> {
    weights: DMatrix<T>,
    bias: DVector<T>,
    activation: Activation,
}

impl<T: Real> Layer<T> {
    /// `weights` is `[outputs × inputs]`; `bias` has one entry per output.
    pub fn new(weights: DMatrix<T>, bias: DVector<T>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weights.nrows()
    }

    fn affine(&self, input: &DMatrix<T>) -> DMatrix<T> {
        let mut z = &self.weights * input;
        for mut column in z.column_iter_mut() {
            column += &self.bias;
        }
        z
    }
}

/// Intermediate values of one forward evaluation, kept for the backward pass.
///
/// A pass is tied to the network that produced it; handing it to another
/// network's [`Network::backward`] fails with [`NetworkError::StaleForwardPass`].
#[derive(Debug, Clone)]
pub struct ForwardPass<T: Real> {
    network_id: u64,
    cluster_count: usize,
    pre_activations: Vec<DMatrix<T>>,
    activations: Vec<DMatrix<T>>,
}

impl<T: Real> ForwardPass<T> {
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }
}

/// A fully connected feed-forward network producing one scalar per input column.
#[derive(Debug, Clone)]
pub struct Network<T: Real> {
    id: u64,
    layers: Vec<Layer<T>>,
}

impl<T: Real> PartialEq for Network<T> {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers
    }
}

impl<T: Real> Network<T> {
    pub fn new(layers: Vec<Layer<T>>) -> Result<Self, NetworkError> {
        let last = layers.last().ok_or(NetworkError::Empty)?;
        if last.output_dim() != 1 {
            return Err(NetworkError::OutputDimension(last.output_dim()));
        }
        for (index, layer) in layers.iter().enumerate() {
            if layer.bias.len() != layer.output_dim() {
                return Err(NetworkError::BiasLength {
                    layer: index,
                    rows: layer.output_dim(),
                    bias: layer.bias.len(),
                });
            }
        }
        for (index, (previous, layer)) in layers.iter().zip(layers.iter().skip(1)).enumerate() {
            if layer.input_dim() != previous.output_dim() {
                return Err(NetworkError::LayerShape {
                    layer: index + 1,
                    expected: layer.input_dim(),
                    found: previous.output_dim(),
                });
            }
        }
        Ok(Self {
            id: NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed),
            layers,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].input_dim()
    }

    pub fn layers(&self) -> &[Layer<T>] {
        &self.layers
    }

    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.bias.len())
            .sum()
    }

    /// Evaluates `input` (`[input_dim × NCLUSTER]`), returning one raw energy per column.
    pub fn forward(&self, input: &DMatrix<T>) -> Result<(Vec<T>, ForwardPass<T>), NetworkError> {
        if input.nrows() != self.input_dim() {
            return Err(NetworkError::InputDimension {
                expected: self.input_dim(),
                found: input.nrows(),
            });
        }

        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut activations = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let z = layer.affine(activations.last().unwrap_or(input));
            let a = z.map(|v| layer.activation.apply(v));
            pre_activations.push(z);
            activations.push(a);
        }

        let energies = activations
            .last()
            .map(|out| out.row(0).iter().copied().collect())
            .unwrap_or_default();
        Ok((
            energies,
            ForwardPass {
                network_id: self.id,
                cluster_count: input.ncols(),
                pre_activations,
                activations,
            },
        ))
    }

    /// Propagates `seed` (`∂E/∂output`, one entry per configuration) back to the
    /// inputs of `pass`, returning `∂E/∂input` shaped `[input_dim × NCLUSTER]`.
    pub fn backward(&self, pass: &ForwardPass<T>, seed: &[T]) -> Result<DMatrix<T>, NetworkError> {
        if pass.network_id != self.id {
            return Err(NetworkError::StaleForwardPass);
        }
        if seed.len() != pass.cluster_count {
            return Err(NetworkError::SeedLength {
                expected: pass.cluster_count,
                found: seed.len(),
            });
        }

        let mut upstream = DMatrix::from_row_slice(1, seed.len(), seed);
        for (index, layer) in self.layers.iter().enumerate().rev() {
            let z = &pass.pre_activations[index];
            let a = &pass.activations[index];
            let slope = z.zip_map(a, |z, a| layer.activation.derivative(z, a));
            let delta = upstream.component_mul(&slope);
            upstream = layer.weights.tr_mul(&delta);
        }
        Ok(upstream)
    }
}
