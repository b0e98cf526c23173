/// Trait used to generate a [`TypeTrait`] for a type.
///
/// # Example
///
/// ```
/// # use dec_reflect::registry::{TypeMeta, TypeTraitObject, FromType};
/// let mut meta = TypeMeta::of::<i32>();
/// meta.insert_trait::<TypeTraitObject>(FromType::<i32>::from_type());
///
/// let object = meta.get_trait::<TypeTraitObject>().unwrap().create();
/// assert!(object.is::<i32>());
/// ```
///
/// [`TypeTrait`]: crate::registry::TypeTrait
pub trait FromType<T> {
    fn from_type() -> Self;
}
