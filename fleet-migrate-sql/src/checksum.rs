/// Uppercase hex MD5 of `content`, the format stored in checksum columns.
///
/// Computed in the application rather than with `MD5()`/`SHA2()` in SQL so
/// that the value does not depend on how the server was built.
pub fn md5_checksum(content: impl AsRef<[u8]>) -> String {
    format!("{:X}", md5::compute(content))
}
