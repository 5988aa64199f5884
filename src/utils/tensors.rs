use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Build a `[batch_size, width]` int tensor from rows already padded to `width`
pub fn index_matrix<B: Backend>(
    rows: &[Vec<usize>],
    width: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();

    let values: Vec<B::IntElem> = rows
        .iter()
        .flat_map(|row| row.iter().map(|index| (*index as i64).elem()))
        .collect();

    Tensor::from_data(Data::new(values, Shape::new([batch_size, width])), device)
}

/// Build a 1D int tensor from a list of indexes
pub fn index_vector<B: Backend>(indexes: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<B::IntElem> = indexes
        .iter()
        .map(|index| (*index as i64).elem())
        .collect();

    Tensor::from_data(Data::new(values, Shape::new([indexes.len()])), device)
}

/// Build a `[rows, cols]` float tensor from row-major values
pub fn float_matrix<B: Backend>(
    values: &[f32],
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<B::FloatElem> = values.iter().map(|value| value.elem()).collect();

    Tensor::from_data(Data::new(values, Shape::new([rows, cols])), device)
}

/// Build a float vector
pub fn float_vector<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 1> {
    let len = values.len();
    let values: Vec<B::FloatElem> = values.iter().map(|value| value.elem()).collect();

    Tensor::from_data(Data::new(values, Shape::new([len])), device)
}

/// Position indexes `[0, width)` repeated for every row: `[batch_size, width]`
fn positions<B: Backend>(batch_size: usize, width: usize, device: &B::Device) -> Tensor<B, 2, Int> {
    let row: Vec<usize> = (0..width).collect();
    let rows = vec![row; batch_size];

    index_matrix(&rows, width, device)
}

/// A `[batch_size, width]` float mask that is 1 for positions before each row's true length
pub fn length_mask<B: Backend>(lengths: Tensor<B, 1, Int>, width: usize) -> Tensor<B, 2> {
    let [batch_size] = lengths.dims();
    let device = lengths.device();

    let lengths = lengths.reshape([batch_size, 1]).repeat(1, width);

    positions::<B>(batch_size, width, &device)
        .lower(lengths)
        .float()
}

/// A `[batch_size, width]` float mask that is 1 only at each row's last real position
pub fn last_position_mask<B: Backend>(lengths: Tensor<B, 1, Int>, width: usize) -> Tensor<B, 2> {
    let [batch_size] = lengths.dims();
    let device = lengths.device();

    let last = lengths.sub_scalar(1).reshape([batch_size, 1]).repeat(1, width);

    positions::<B>(batch_size, width, &device)
        .equal(last)
        .float()
}

/// Read a 2D float tensor back into row-major values
pub fn to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Vec<Vec<f32>> {
    let [_, cols] = tensor.dims();
    let values = tensor.into_data().convert::<f32>().value;

    values.chunks(cols.max(1)).map(<[f32]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use burn::backend::{ndarray::NdArrayDevice, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_length_mask_uses_true_lengths() {
        let device = NdArrayDevice::Cpu;
        let lengths = index_vector::<TestBackend>(&[3, 1], &device);

        let mask = to_rows(length_mask(lengths, 4));

        assert_eq!(
            mask,
            vec![vec![1.0, 1.0, 1.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_last_position_mask() {
        let device = NdArrayDevice::Cpu;
        let lengths = index_vector::<TestBackend>(&[3, 1], &device);

        let mask = to_rows(last_position_mask(lengths, 4));

        assert_eq!(
            mask,
            vec![vec![0.0, 0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_index_matrix_shape() {
        let device = NdArrayDevice::Cpu;
        let tokens = index_matrix::<TestBackend>(&[vec![1, 2, 0], vec![3, 0, 0]], 3, &device);

        assert_eq!(tokens.dims(), [2, 3]);
        assert_eq!(
            tokens.into_data().convert::<i64>().value,
            vec![1, 2, 0, 3, 0, 0]
        );
    }
}
