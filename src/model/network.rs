use std::fmt;
use std::path::Path;

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{loss, ops, AdamW, Init, Linear, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NetworkError;
use crate::labels::argmax;

pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

/// Variable prefixes, matching the layer names in the summary table.
pub const HIDDEN_LAYER: &str = "dense";
pub const OUTPUT_LAYER: &str = "dense_1";

/// Dense(input → hidden) + ReLU, then Dense(hidden → output) + softmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub input_dim: usize,
    pub hidden_units: usize,
    pub output_dim: usize,
}

impl Topology {
    pub fn param_count(&self) -> usize {
        (self.input_dim + 1) * self.hidden_units + (self.hidden_units + 1) * self.output_dim
    }
}

/// Loss and accuracy over a set of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub loss: f32,
    pub accuracy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train: Metrics,
    pub validation: Option<Metrics>,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    pub epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Trailing share of the training rows held out for validation.
    pub validation_split: f64,
    pub learning_rate: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// The classifier: two candle `Linear` layers whose weights live in a `VarMap`.
pub struct Network {
    topology: Topology,
    varmap: VarMap,
    hidden: Linear,
    output: Linear,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("topology", &self.topology)
            .finish_non_exhaustive()
    }
}

impl Network {
    /// Glorot-uniform weights drawn from `rng`, zero bias.
    pub fn new<R: Rng + ?Sized>(topology: Topology, rng: &mut R) -> Result<Self, NetworkError> {
        let mut network = Self::zeroed(topology)?;
        let layers = [
            (HIDDEN_LAYER, topology.input_dim, topology.hidden_units),
            (OUTPUT_LAYER, topology.hidden_units, topology.output_dim),
        ];
        for (name, fan_in, fan_out) in layers {
            let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
            let values: Vec<f32> = (0..fan_in * fan_out)
                .map(|_| rng.gen_range(-limit..limit))
                .collect();
            let weight = Tensor::from_vec(values, (fan_out, fan_in), &Device::Cpu)?;
            network.varmap.set_one(format!("{name}.weight"), weight)?;
        }
        Ok(network)
    }

    /// Build `topology` and fill it from a safetensors file.
    ///
    /// Fails if any stored tensor is missing or has a different shape.
    pub fn load(topology: Topology, path: &Path) -> candle_core::Result<Self> {
        let mut network = Self::zeroed(topology)?;
        network.varmap.load(path)?;
        Ok(network)
    }

    pub fn save(&self, path: &Path) -> candle_core::Result<()> {
        self.varmap.save(path)
    }

    fn zeroed(topology: Topology) -> candle_core::Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let hidden = dense(vb.pp(HIDDEN_LAYER), topology.input_dim, topology.hidden_units)?;
        let output = dense(vb.pp(OUTPUT_LAYER), topology.hidden_units, topology.output_dim)?;
        Ok(Self {
            topology,
            varmap,
            hidden,
            output,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn input_dim(&self) -> usize {
        self.topology.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.topology.output_dim
    }

    pub fn param_count(&self) -> usize {
        self.topology.param_count()
    }

    fn logits(&self, inputs: &Tensor) -> candle_core::Result<Tensor> {
        inputs.apply(&self.hidden)?.relu()?.apply(&self.output)
    }

    fn check_input(&self, x: &Array2<f32>) -> Result<(), NetworkError> {
        if x.ncols() != self.input_dim() {
            return Err(NetworkError::InputWidth {
                expected: self.input_dim(),
                found: x.ncols(),
            });
        }
        Ok(())
    }

    fn check_pair(&self, x: &Array2<f32>, y: &Array2<f32>) -> Result<(), NetworkError> {
        self.check_input(x)?;
        if y.ncols() != self.output_dim() {
            return Err(NetworkError::TargetWidth {
                expected: self.output_dim(),
                found: y.ncols(),
            });
        }
        if x.nrows() != y.nrows() {
            return Err(NetworkError::RowMismatch {
                inputs: x.nrows(),
                targets: y.nrows(),
            });
        }
        if x.nrows() == 0 {
            return Err(NetworkError::EmptyBatch);
        }
        Ok(())
    }

    /// One probability row per input row.
    pub fn predict(&self, x: &Array2<f32>) -> Result<Array2<f32>, NetworkError> {
        self.check_input(x)?;
        let logits = self.logits(&to_tensor(x)?)?;
        let probabilities = ops::softmax(&logits, D::Minus1)?;
        let (rows, cols) = probabilities.dims2()?;
        let flat = probabilities.flatten_all()?.to_vec1::<f32>()?;
        Ok(Array2::from_shape_vec((rows, cols), flat)?)
    }

    /// Cross-entropy and argmax accuracy against one-hot targets.
    pub fn evaluate(&self, x: &Array2<f32>, y: &Array2<f32>) -> Result<Metrics, NetworkError> {
        self.check_pair(x, y)?;
        Ok(self.metrics(&to_tensor(x)?, &class_targets(y)?)?)
    }

    fn metrics(&self, inputs: &Tensor, targets: &Tensor) -> candle_core::Result<Metrics> {
        let logits = self.logits(inputs)?;
        let loss = loss::cross_entropy(&logits, targets)?.to_scalar::<f32>()?;
        let rows = targets.dim(0)?.max(1) as f32;
        Ok(Metrics {
            loss,
            accuracy: correct_count(&logits, targets)? / rows,
        })
    }

    /// Mini-batch Adam on categorical cross-entropy.
    ///
    /// The last `validation_split` share of rows is held out before any
    /// shuffling; the remaining rows are reshuffled every epoch.
    pub fn fit<R, F>(
        &mut self,
        x: &Array2<f32>,
        y: &Array2<f32>,
        options: &FitOptions,
        rng: &mut R,
        mut on_epoch: F,
    ) -> Result<History, NetworkError>
    where
        R: Rng + ?Sized,
        F: FnMut(&EpochMetrics),
    {
        self.check_pair(x, y)?;
        if options.batch_size == 0 {
            return Err(NetworkError::ZeroBatchSize);
        }
        if !(0.0..1.0).contains(&options.validation_split) {
            return Err(NetworkError::InvalidValidationSplit(options.validation_split));
        }

        let rows = x.nrows();
        let train_rows = (rows as f64 * (1.0 - options.validation_split)) as usize;
        if train_rows == 0 {
            return Err(NetworkError::EmptyBatch);
        }
        let inputs = to_tensor(x)?;
        let targets = class_targets(y)?;
        let train_x = inputs.narrow(0, 0, train_rows)?;
        let train_y = targets.narrow(0, 0, train_rows)?;
        let validation = if train_rows < rows {
            let held_out = rows - train_rows;
            Some((
                inputs.narrow(0, train_rows, held_out)?,
                targets.narrow(0, train_rows, held_out)?,
            ))
        } else {
            None
        };

        // AdamW without weight decay is plain Adam.
        let params = ParamsAdamW {
            lr: f64::from(options.learning_rate),
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            weight_decay: 0.0,
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), params)?;
        let mut order: Vec<u32> = (0..train_rows as u32).collect();
        let mut history = History::default();

        for epoch in 1..=options.epochs {
            order.shuffle(rng);
            let mut loss_sum = 0.0;
            let mut correct = 0.0;
            for batch in order.chunks(options.batch_size) {
                let index = Tensor::from_slice(batch, batch.len(), &Device::Cpu)?;
                let xb = train_x.index_select(&index, 0)?;
                let yb = train_y.index_select(&index, 0)?;
                let logits = self.logits(&xb)?;
                let batch_loss = loss::cross_entropy(&logits, &yb)?;
                loss_sum += batch_loss.to_scalar::<f32>()? * batch.len() as f32;
                correct += correct_count(&logits, &yb)?;
                optimizer.backward_step(&batch_loss)?;
            }
            let train = Metrics {
                loss: loss_sum / train_rows as f32,
                accuracy: correct / train_rows as f32,
            };
            let held_out = match &validation {
                Some((vx, vy)) => Some(self.metrics(vx, vy)?),
                None => None,
            };
            let summary = EpochMetrics {
                epoch,
                train,
                validation: held_out,
            };
            info!(
                epoch,
                loss = train.loss,
                accuracy = train.accuracy,
                val_loss = held_out.map(|m| m.loss),
                val_accuracy = held_out.map(|m| m.accuracy),
                "epoch finished"
            );
            on_epoch(&summary);
            history.epochs.push(summary);
        }
        Ok(history)
    }
}

fn dense(vb: VarBuilder, fan_in: usize, fan_out: usize) -> candle_core::Result<Linear> {
    let weight = vb.get_with_hints((fan_out, fan_in), "weight", Init::Const(0.0))?;
    let bias = vb.get_with_hints(fan_out, "bias", Init::Const(0.0))?;
    Ok(Linear::new(weight, Some(bias)))
}

fn to_tensor(x: &Array2<f32>) -> candle_core::Result<Tensor> {
    let flat: Vec<f32> = x.iter().copied().collect();
    Tensor::from_vec(flat, x.dim(), &Device::Cpu)
}

/// Class index of every one-hot row.
fn class_targets(y: &Array2<f32>) -> candle_core::Result<Tensor> {
    let indices: Vec<u32> = y
        .rows()
        .into_iter()
        .map(|row| argmax(row.iter().copied()).unwrap_or(0) as u32)
        .collect();
    Tensor::from_vec(indices, y.nrows(), &Device::Cpu)
}

fn correct_count(logits: &Tensor, targets: &Tensor) -> candle_core::Result<f32> {
    logits
        .argmax(D::Minus1)?
        .eq(targets)?
        .to_dtype(DType::F32)?
        .sum_all()?
        .to_scalar::<f32>()
}
