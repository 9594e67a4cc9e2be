pub mod cascade;
pub mod common;
pub mod filter;

// The core trait shared by everything that sits in a channel's signal path
pub trait Stage: Send + Sync + 'static {
    // Process a single sample through this stage
    fn process(&mut self, input: f32) -> f32;

    // Process a block of samples in place
    fn process_block(&mut self, input: &mut [f32]) {
        for sample in input.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    // Clear any internal history, e.g. after a stream restart
    fn reset(&mut self);

    // Linear gain this stage applies at `frequency`, for display purposes
    fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32;
}
