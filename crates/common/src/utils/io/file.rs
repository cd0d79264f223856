use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use eyre::Result;

/// Write contents to a file on the disc, creating parent directories as needed.
///
/// ```no_run
/// use evmstate_common::utils::io::file::write_file;
///
/// let path = "/tmp/test.txt";
/// let contents = "Hello, World!";
/// let result = write_file(path, contents);
/// ```
pub fn write_file(path_str: &str, contents: &str) -> Result<()> {
    let path = Path::new(path_str);

    // Create the directory if it doesn't exist
    fs::create_dir_all(path.parent().ok_or_else(|| eyre::eyre!("unable to create directory"))?)?;

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;

    Ok(())
}

/// Read contents from a file on the disc
///
/// ```no_run
/// use evmstate_common::utils::io::file::read_file;
///
/// let path = "/tmp/test.txt";
/// let contents = read_file(path);
/// ```
pub fn read_file(path: &str) -> Result<String> {
    let path = Path::new(path);
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Delete a file from the disc. Returns `true` if the file is gone afterwards.
///
/// ```no_run
/// use evmstate_common::utils::io::file::delete_path;
///
/// let path = "/tmp/test.txt";
/// let result = delete_path(path);
/// ```
pub fn delete_path(path: &str) -> bool {
    let path = Path::new(path);
    if !path.exists() {
        return true;
    }

    if path.is_dir() {
        fs::remove_dir_all(path).is_ok()
    } else {
        fs::remove_file(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete() {
        let dir = std::env::temp_dir().join(format!("evmstate-file-test-{}", std::process::id()));
        let path = dir.join("nested").join("file.txt");
        let path = path.to_str().expect("temp path is not utf-8");

        write_file(path, "hello").expect("failed to write file");
        assert_eq!(read_file(path).expect("failed to read file"), "hello");

        assert!(delete_path(path));
        assert!(read_file(path).is_err());
        assert!(delete_path(dir.to_str().expect("temp path is not utf-8")));
    }

    #[test]
    fn test_delete_missing_path() {
        assert!(delete_path("/this/path/should/not/exist/evmstate"));
    }
}
