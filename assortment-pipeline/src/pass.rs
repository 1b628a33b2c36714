use assortment_core::{AssortmentResult, Store};

/// A batch pass over the store snapshot.
///
/// Passes never mutate their input: each returns a fresh snapshot, and the
/// pipeline that owns them decides the order they run in.
pub trait StorePass: Send + Sync {
    /// Decide if this pass should run for the given snapshot.
    fn enable(&self, _stores: &[Store]) -> bool {
        true
    }

    /// Produce the next snapshot.
    fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>>;

    /// Returns a stable name for logging.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Extract a short type name from the full module path.
///
/// Given `"my_crate::some_module::MyType"`, returns `"MyType"`.
pub fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;

    impl StorePass for Identity {
        fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>> {
            Ok(stores.to_vec())
        }
    }

    #[test]
    fn default_name_is_short_type_name() {
        assert_eq!(Identity.name(), "Identity");
        assert_eq!(short_type_name("a::b::GreedyClusterPass"), "GreedyClusterPass");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
