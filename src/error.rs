use crate::{dart::Dart, orbit::Orbit};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Darts and embeddings.
    #[error("dart {0} is not a live dart of this map")]
    InvalidDart(Dart),
    #[error("the {0} orbit has no embedding")]
    NotEmbedded(Orbit),
    // Attributes.
    #[error("an attribute named '{0}' already exists")]
    DuplicateAttribute(String),
    #[error("no attribute named '{0}'")]
    AttributeNotFound(String),
    #[error("attribute holds values of type {stored}, but {requested} was requested")]
    TypeMismatch { stored: String, requested: String },
    #[error("attribute is attached to the {0} orbit, not the {1} orbit")]
    WrongOrbit(Orbit, Orbit),
    #[error("the attribute handle refers to a removed attribute")]
    StaleAttributeHandle,
    #[error("attribute line {0} is out of bounds")]
    OutOfBoundsAccess(u32),
    #[error("attribute line {0} has been released")]
    ReleasedLine(u32),
    // Topology edits.
    #[error("edge of dart {0} cannot be collapsed without breaking the manifold")]
    NonCollapsibleEdge(Dart),
    #[error("the plane cut is degenerate around dart {0}")]
    DegenerateCut(Dart),
    #[error("cannot split the face between darts {0} and {1}")]
    CannotSplitFace(Dart, Dart),
    #[error("dart {0} belongs to a boundary face")]
    BoundaryFace(Dart),
    // Construction.
    #[error("vertex {0} is not manifold")]
    ComplexVertex(u32),
    #[error("edge ({0}, {1}) is used by more than one face with the same orientation")]
    ComplexEdge(u32, u32),
    #[error("face {0} has fewer than 3 distinct vertices")]
    InvalidFace(usize),
    #[error("vertex index {0} is out of range")]
    VertexIndexOutOfRange(u32),
    // Consistency checks.
    #[error("phi1 is not a permutation at dart {0}")]
    BrokenPhi1(Dart),
    #[error("phi2 is not a fixed point free involution at dart {0}")]
    BrokenPhi2(Dart),
    #[error("boundary marks are inconsistent at dart {0}")]
    InconsistentBoundary(Dart),
    #[error("{0} embedding is inconsistent at dart {1}")]
    InconsistentEmbedding(Orbit, Dart),
    #[error("{0} line {1} is shared by more than one cell")]
    SharedEmbedding(Orbit, u32),
    #[error("dart slot {0} disagrees with the free list")]
    CorruptFreeList(u32),
    #[error("{1} {0} lines are used but not referenced by any cell")]
    LeakedLines(Orbit, usize),
    // Resources and IO.
    #[error("allocation failed")]
    AllocationFailed,
    #[error("failed to load OBJ file: {0}")]
    ObjLoadFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("unsupported format version {0}")]
    UnsupportedFormat(u32),
    #[error("mismatched array lengths: {0} and {1}")]
    MismatchedArrayLengths(usize, usize),
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}
