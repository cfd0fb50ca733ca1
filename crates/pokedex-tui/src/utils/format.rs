/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Human-readable byte count
pub fn format_bytes(len: usize) -> String {
    if len < 1024 {
        format!("{} B", len)
    } else {
        format!("{:.1} KB", len as f64 / 1024.0)
    }
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Width and height from a PNG header, if `bytes` is a PNG.
pub fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

/// Entry id from an in-app path such as `/pokemon/25`.
pub fn pokemon_id_from_path(path: &str) -> Option<&str> {
    let id = path.strip_prefix("/pokemon/")?.trim_end_matches('/');
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}
