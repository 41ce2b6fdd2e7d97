//! Bridging between host `ndarray` buffers and `burn` tensors.
use burn::tensor::{backend::Backend, Float, Int, Tensor, TensorData};
use ndarray as nd;

/// Upload a host array onto a burn device as a float tensor of the same shape.
pub trait ToBurn<B: Backend, const D: usize> {
    fn to_burn(&self, device: &B::Device) -> Tensor<B, D, Float>;
}
impl<B: Backend> ToBurn<B, 1> for nd::Array1<f32> {
    fn to_burn(&self, device: &B::Device) -> Tensor<B, 1, Float> {
        let data = TensorData::new(self.iter().copied().collect::<Vec<f32>>(), [self.len()]);
        Tensor::from_data(data, device)
    }
}
impl<B: Backend> ToBurn<B, 2> for nd::Array2<f32> {
    fn to_burn(&self, device: &B::Device) -> Tensor<B, 2, Float> {
        let (rows, cols) = self.dim();
        let data = TensorData::new(self.iter().copied().collect::<Vec<f32>>(), [rows, cols]);
        Tensor::from_data(data, device)
    }
}
impl<B: Backend> ToBurn<B, 3> for nd::Array3<f32> {
    fn to_burn(&self, device: &B::Device) -> Tensor<B, 3, Float> {
        let (d0, d1, d2) = self.dim();
        let data = TensorData::new(self.iter().copied().collect::<Vec<f32>>(), [d0, d1, d2]);
        Tensor::from_data(data, device)
    }
}

/// Upload an index matrix (e.g. triangle faces) as an int tensor.
pub fn faces_to_burn<B: Backend>(faces: &nd::Array2<u32>, device: &B::Device) -> Tensor<B, 2, Int> {
    let (rows, cols) = faces.dim();
    let data: Vec<i64> = faces.iter().map(|&x| i64::from(x)).collect();
    Tensor::from_data(TensorData::new(data, [rows, cols]), device)
}

/// Index tensor for `select`/gather style ops.
#[allow(clippy::cast_possible_wrap)]
pub fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(data, [indices.len()]), device)
}

/// Download a float tensor to a flat host vector in row-major order.
pub fn tensor_to_data_float<B: Backend, const D: usize>(tensor: &Tensor<B, D, Float>) -> Vec<f32> {
    tensor.to_data().iter::<f32>().collect()
}
