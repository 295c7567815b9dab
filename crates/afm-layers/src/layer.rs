//! Layer trait definition for neural network layers.

use crate::error::LayerError;
use crate::tensor::Tensor;

/// A neural network layer.
///
/// This trait defines the forward interface shared by all layers in this
/// crate. Gradient computation is the concern of an external optimizer and
/// is not part of the trait.
///
/// # Example
///
/// ```
/// use afm_layers::dense::Dense;
/// use afm_layers::layer::Layer;
/// use afm_layers::tensor::Tensor;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let layer = Dense::new(128, 64, &mut rng);
/// let input = Tensor::zeros(&[32, 128]); // batch of 32, input dim 128
/// let output = layer.forward(&input).unwrap();
/// assert_eq!(output.shape(), &[32, 64]);
/// ```
pub trait Layer: Send + Sync {
    /// Performs a forward pass through the layer.
    ///
    /// # Errors
    ///
    /// Returns a [`LayerError`] if the input shape is incompatible with the
    /// layer.
    fn forward(&self, input: &Tensor) -> Result<Tensor, LayerError>;

    /// Returns references to the layer's learnable parameters.
    fn parameters(&self) -> Vec<&Tensor>;

    /// Returns mutable references to the layer's learnable parameters.
    ///
    /// This is the seam an external optimizer uses to update weights.
    fn parameters_mut(&mut self) -> Vec<&mut Tensor>;

    /// Returns the name of the layer for debugging and logging purposes.
    fn name(&self) -> &str {
        "Layer"
    }

    /// Returns whether the layer is in training mode.
    ///
    /// Some layers behave differently during training vs inference
    /// (e.g., Dropout).
    fn is_training(&self) -> bool {
        true
    }

    /// Sets the layer's training mode.
    fn set_training(&mut self, _training: bool) {
        // Default implementation does nothing
    }
}
