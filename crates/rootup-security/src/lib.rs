mod checksum;
mod ed25519;

pub use checksum::sha256_hex;
pub use ed25519::verify_template_signature;
