use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{CoordinateList, ParseError};

/// 从 `reader` 逐行解析坐标. `path` 仅用于构造错误信息.
///
/// 每行必须恰好是两个以空白分隔的浮点数 `x y`; 仅含空白的行被忽略.
pub fn parse_coordinates<R: BufRead>(reader: R, path: &Path) -> Result<CoordinateList, ParseError> {
    let mut coords = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ParseError::Io {
            path: path.to_owned(),
            source,
        })?;
        let malformed = || ParseError::MalformedLine {
            path: path.to_owned(),
            line: idx + 1,
            content: line.clone(),
        };

        let mut tokens = line.split_whitespace();
        let (x, y) = match (tokens.next(), tokens.next(), tokens.next()) {
            (None, _, _) => continue,
            (Some(x), Some(y), None) => (x, y),
            _ => return Err(malformed()),
        };
        match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(x), Ok(y)) => coords.push((x, y)),
            _ => return Err(malformed()),
        }
    }
    Ok(coords)
}

/// 读取并解析 `path` 处的轮廓文件. 文件句柄在返回前释放.
pub fn read_coordinates<P: AsRef<Path>>(path: P) -> Result<CoordinateList, ParseError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_coordinates(BufReader::new(file), path)
}

#[cfg(test)]
mod tests {
    use super::{parse_coordinates, read_coordinates};
    use crate::contour::ParseError;
    use std::path::Path;

    fn parse(text: &str) -> Result<Vec<(f64, f64)>, ParseError> {
        parse_coordinates(text.as_bytes(), Path::new("mem.txt"))
    }

    #[test]
    fn test_parse_ok() {
        let coords = parse("120.50 137.50\n121.00 137.50\r\n\n  121.5\t138.0  \n").unwrap();
        assert_eq!(coords, [(120.5, 137.5), (121.0, 137.5), (121.5, 138.0)]);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        for text in ["1.0 2.0\n3.0\n", "1.0 2.0\n3.0 4.0 5.0\n", "1.0 2.0\nx 4.0\n"] {
            match parse(text).unwrap_err() {
                ParseError::MalformedLine { line, .. } => assert_eq!(line, 2),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_coordinates(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
