use std::sync::Arc;

/// A next-token model.
///
/// `predict` receives one normalized window (`sequence_length` values in
/// `[0, 1)`) and returns a probability distribution whose length is the
/// vocabulary size. Calls are independent of each other.
pub trait Predictor {
    fn predict(&self, window: &[f32]) -> Vec<f32>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, window: &[f32]) -> Vec<f32> {
        (**self).predict(window)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, window: &[f32]) -> Vec<f32> {
        (**self).predict(window)
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict(&self, window: &[f32]) -> Vec<f32> {
        (**self).predict(window)
    }
}

/// Index of the largest value, lowest index on ties. `None` when empty.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.9]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
        assert_eq!(argmax(&[0.1, 0.45, 0.45]), Some(1));
    }

    struct Uniform(usize);

    impl Predictor for Uniform {
        fn predict(&self, _window: &[f32]) -> Vec<f32> {
            vec![1.0 / self.0 as f32; self.0]
        }
    }

    #[test]
    fn boxed_and_shared_predictors_delegate() {
        let boxed: Box<dyn Predictor> = Box::new(Uniform(4));
        let shared: Arc<dyn Predictor> = Arc::new(Uniform(4));
        assert_eq!(boxed.predict(&[0.0]).len(), 4);
        assert_eq!((&shared).predict(&[0.0]).len(), 4);
    }
}
