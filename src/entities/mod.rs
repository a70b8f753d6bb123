/// wires a struct with an `id: String` field into the store under `$kind`
macro_rules! impl_entity {
    ($ty:ty, $kind:expr) => {
        impl crate::store::Entity for $ty {
            const KIND: &'static str = $kind;
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

pub(crate) use impl_entity;

pub mod governance;
pub mod lending;
