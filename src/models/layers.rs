use burn::{
    module::{Module, ModuleMapper, Param, ParamId},
    nn::{Embedding, EmbeddingConfig, Linear, LinearConfig},
    tensor::{backend::Backend, Data, ElementConversion, Shape, Tensor},
};
use rand::Rng;

use crate::{
    error::{Error, Result},
    utils::tensors,
    vocab::EmbeddingMatrix,
};

/// An embedding table with entries drawn uniformly from `[-0.5, 0.5)`
pub fn random_embedding<B: Backend, R: Rng>(
    n_embedding: usize,
    d_model: usize,
    rng: &mut R,
    device: &B::Device,
) -> Embedding<B> {
    let values: Vec<f32> = (0..n_embedding * d_model)
        .map(|_| rng.gen_range(-0.5..0.5))
        .collect();

    let matrix = EmbeddingMatrix {
        values,
        rows: n_embedding,
        dim: d_model,
    };

    embedding_from_matrix(&matrix, device)
}

/// An embedding table holding the rows of a pretrained matrix
pub fn embedding_from_matrix<B: Backend>(
    matrix: &EmbeddingMatrix,
    device: &B::Device,
) -> Embedding<B> {
    let mut embedding = EmbeddingConfig::new(matrix.rows, matrix.dim).init(device);

    embedding.weight = Param::from_tensor(tensors::float_matrix(
        &matrix.values,
        matrix.rows,
        matrix.dim,
        device,
    ));

    embedding
}

/// The embedding table for a model: pretrained when a matrix is given, random otherwise
pub fn embedding<B: Backend, R: Rng>(
    n_embedding: usize,
    d_model: usize,
    pretrained: Option<&EmbeddingMatrix>,
    freeze: bool,
    rng: &mut R,
    device: &B::Device,
) -> Result<Embedding<B>> {
    let embedding = match pretrained {
        Some(matrix) if matrix.rows != n_embedding || matrix.dim != d_model => {
            return Err(Error::invalid(format!(
                "pretrained matrix is {}x{} but the model expects {}x{}",
                matrix.rows, matrix.dim, n_embedding, d_model
            )));
        }
        Some(matrix) => embedding_from_matrix(matrix, device),
        None => random_embedding(n_embedding, d_model, rng, device),
    };

    Ok(if freeze {
        embedding.no_grad()
    } else {
        embedding
    })
}

/// A linear layer initialised uniformly in `[-1/sqrt(d_input), 1/sqrt(d_input))`
pub fn random_linear<B: Backend, R: Rng>(
    d_input: usize,
    d_output: usize,
    rng: &mut R,
    device: &B::Device,
) -> Linear<B> {
    let bound = 1.0 / (d_input.max(1) as f32).sqrt();
    let mut sample = |n: usize| -> Vec<f32> { (0..n).map(|_| rng.gen_range(-bound..bound)).collect() };

    let weight = sample(d_input * d_output);
    let bias = sample(d_output);

    let mut linear = LinearConfig::new(d_input, d_output).init(device);

    linear.weight = Param::from_tensor(tensors::float_matrix(&weight, d_input, d_output, device));
    linear.bias = Some(Param::from_tensor(tensors::float_vector(&bias, device)));

    linear
}

/// Redraws every float parameter of a module uniformly from `[-bound, bound)`
struct UniformInit<'a, R: Rng> {
    bound: f32,
    rng: &'a mut R,
}

impl<B: Backend, R: Rng> ModuleMapper<B> for UniformInit<'_, R> {
    fn map_float<const D: usize>(&mut self, _id: &ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let dims = tensor.dims();
        let device = tensor.device();
        let require_grad = tensor.is_require_grad();

        let values: Vec<B::FloatElem> = (0..dims.iter().product::<usize>())
            .map(|_| self.rng.gen_range(-self.bound..self.bound).elem())
            .collect();

        Tensor::from_data(Data::new(values, Shape::new(dims)), &device).set_require_grad(require_grad)
    }
}

/// Replace all of a module's float parameters with values drawn from `rng`
///
/// Layers such as the LSTM draw their initial weights from the backend's global generator;
/// mapping over them afterwards makes the weights depend on `rng` alone.
pub fn reinit_uniform<B: Backend, M: Module<B>, R: Rng>(module: M, bound: f32, rng: &mut R) -> M {
    module.map(&mut UniformInit { bound, rng })
}
