//! Use Case capability
//!
//! A use case takes one typed input and produces one typed output, or fails
//! with exactly its declared error type. Because the error is an associated
//! type, the presentation layer can map every failure exhaustively.

/// A single typed unit of application logic
///
/// Implementations hold only what they captured at construction, so one
/// instance may be applied repeatedly and concurrently.
///
/// ## Examples
/// ```rust
/// use kernel::use_case::UseCase;
///
/// struct Echo;
///
/// impl UseCase for Echo {
///     type Input = String;
///     type Output = String;
///     type Error = std::convert::Infallible;
///
///     async fn apply(&self, input: String) -> Result<String, Self::Error> {
///         Ok(input)
///     }
/// }
/// ```
#[trait_variant::make(UseCase: Send)]
pub trait LocalUseCase {
    type Input;
    type Output;
    type Error: std::error::Error;

    async fn apply(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
