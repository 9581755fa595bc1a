use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads the next line, including its terminator. Returns `None` at the
/// end of input or on a read error.
///
/// Pass the same reader on every call: whatever it buffered beyond the
/// line stays there for the next one.
pub async fn read_line<R>(reader: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffered_lines_are_kept() {
        let mut reader: &[u8] = b"/attach a.txt\nHello\n/quit";

        assert_eq!(
            read_line(&mut reader).await.as_deref(),
            Some("/attach a.txt\n")
        );
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("Hello\n"));
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("/quit"));
        assert_eq!(read_line(&mut reader).await, None);
    }
}
