/*!
 * Batch rewriting through a text-completion provider.
 *
 * - `batch`: contiguous batching and numbered line flattening
 * - `reconcile`: mapping a numbered response back onto the batch entries
 * - `core`: the service driving each batch through send, reconcile and retry
 */

pub use self::batch::{batches, Batches, FlattenedBatch, LineRecord};
pub use self::core::{BatchOutcome, BatchState, TranslationService};
pub use self::reconcile::{align, parse_numbered_response, reconcile, resegment, ResponseLines};

pub mod batch;
pub mod core;
pub mod reconcile;
