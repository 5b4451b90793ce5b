//! §4.2 Context Hydrator and §4.3 Prompt Provenance.

mod hashing;
mod packet;
mod provenance;

pub use hashing::sha256_hex;
pub use packet::{
    context_packet_path, extract_quality_gates, hydrate, write_context_packet, ContextPacket, DependencyResolver,
    HydrationError, NullResolver, CONTEXT_PACKET_FILE,
};
pub use provenance::{
    build_provenance, provenance_path, write_provenance, ContextSource, ProvenanceError, PromptProvenance,
    SourceCandidate, SourceType, PROVENANCE_FILE,
};
