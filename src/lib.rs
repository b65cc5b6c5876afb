pub mod binding;
pub mod buffer;
pub mod compression;
pub mod encoder;
pub mod message;

pub mod errors {
    error_chain::error_chain! {
        foreign_links {
            IoError(std::io::Error);
            JsonError(serde_json::Error);
        }

        errors {
            Configuration(reason: String) {
                description("invalid encoder configuration")
                display("invalid encoder configuration: {}", reason)
            }
            Compression {
                description("failed to compress message")
                display("failed to compress message")
            }
            Decompression {
                description("failed to decompress message")
                display("failed to decompress message")
            }
            InnerEncoder(reason: String) {
                description("inner message encoder failed")
                display("inner message encoder failed: {}", reason)
            }
            Allocation(size: usize) {
                description("buffer manager refused allocation")
                display("buffer manager refused to provide a buffer of {} bytes", size)
            }
        }
    }
}
