//! In-memory data directory.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use playdate_core::file::{FileError, FileOptions, FileStat, FileSystem, Whence};
use playdate_core::handle::File;

#[derive(Clone, Debug)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug)]
struct OpenFile {
    path: String,
    pos: usize,
    mode: FileOptions,
}

/// Host [`FileSystem`] keyed by normalized path. The root always exists.
pub struct SimFiles {
    nodes: RefCell<BTreeMap<String, Node>>,
    open: RefCell<BTreeMap<usize, OpenFile>>,
    next_handle: Cell<usize>,
    last_error: Cell<Option<&'static str>>,
}

impl Default for SimFiles {
    fn default() -> Self {
        Self {
            nodes: RefCell::new(BTreeMap::new()),
            open: RefCell::new(BTreeMap::new()),
            next_handle: Cell::new(1),
            last_error: Cell::new(None),
        }
    }
}

/// Strip leading, trailing and repeated slashes.
fn normalize(path: &str) -> Result<String, FileError> {
    if path.contains('\0') {
        return Err(FileError::InvalidPath);
    }
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
    Ok(parts.join("/"))
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn is_child_of(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return !path.is_empty();
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

impl SimFiles {
    /// Create a file with `contents`, creating parent directories.
    pub fn insert(&self, path: &str, contents: &[u8]) {
        let Ok(path) = normalize(path) else { return };
        let mut nodes = self.nodes.borrow_mut();
        let mut dir = parent(&path);
        while !dir.is_empty() {
            nodes.insert(dir.to_string(), Node::Dir);
            dir = parent(dir);
        }
        nodes.insert(path, Node::File(contents.to_vec()));
    }

    /// Contents of the file at `path`.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let path = normalize(path).ok()?;
        match self.nodes.borrow().get(&path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn open_count(&self) -> usize {
        self.open.borrow().len()
    }

    fn fail<T>(&self, error: FileError, message: &'static str) -> Result<T, FileError> {
        log::debug!("file: {message}");
        self.last_error.set(Some(message));
        Err(error)
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || matches!(self.nodes.borrow().get(path), Some(Node::Dir))
    }

    fn with_open<T>(
        &self,
        file: File,
        f: impl FnOnce(&mut OpenFile, &mut BTreeMap<String, Node>) -> Result<T, FileError>,
    ) -> Result<T, FileError> {
        let mut open = self.open.borrow_mut();
        let Some(handle) = open.get_mut(&file.raw()) else {
            return self.fail(FileError::Failed, "bad file handle");
        };
        f(handle, &mut self.nodes.borrow_mut())
    }
}

impl FileSystem for SimFiles {
    fn list_files(
        &self,
        path: &str,
        show_hidden: bool,
        f: &mut dyn FnMut(&str),
    ) -> Result<(), FileError> {
        let dir = normalize(path)?;
        if !self.is_dir(&dir) {
            return self.fail(FileError::NotFound, "no such directory");
        }

        let entries: Vec<String> = self
            .nodes
            .borrow()
            .iter()
            .filter(|(p, _)| is_child_of(p, &dir) && parent(p) == dir)
            .map(|(p, node)| {
                let name = p.rsplit('/').next().unwrap_or(p.as_str());
                match node {
                    Node::Dir => format!("{name}/"),
                    Node::File(_) => name.to_string(),
                }
            })
            .filter(|name| show_hidden || !name.starts_with('.'))
            .collect();

        // Released before calling out so the callback may use the filesystem
        for name in &entries {
            f(name);
        }
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<FileStat, FileError> {
        let path = normalize(path)?;
        let size = match self.nodes.borrow().get(&path) {
            Some(Node::File(data)) => Some(data.len() as u32),
            Some(Node::Dir) => None,
            None if path.is_empty() => None,
            None => return self.fail(FileError::NotFound, "no such file"),
        };
        Ok(FileStat {
            is_dir: size.is_none(),
            size: size.unwrap_or(0),
            year: 2000,
            month: 1,
            day: 1,
            ..FileStat::default()
        })
    }

    fn mkdir(&self, path: &str) -> Result<(), FileError> {
        let path = normalize(path)?;
        if !self.is_dir(parent(&path)) {
            return self.fail(FileError::NotFound, "parent directory missing");
        }
        if matches!(self.nodes.borrow().get(&path), Some(Node::File(_))) {
            return self.fail(FileError::Failed, "file exists");
        }
        self.nodes.borrow_mut().insert(path, Node::Dir);
        Ok(())
    }

    fn unlink(&self, path: &str, recursive: bool) -> Result<(), FileError> {
        let path = normalize(path)?;
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(&path) {
            drop(nodes);
            return self.fail(FileError::NotFound, "no such file");
        }

        let children: Vec<String> = nodes.keys().filter(|p| is_child_of(p, &path)).cloned().collect();
        if !children.is_empty() && !recursive {
            drop(nodes);
            return self.fail(FileError::Failed, "directory not empty");
        }
        for child in children {
            nodes.remove(&child);
        }
        nodes.remove(&path);
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<(), FileError> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        if !self.is_dir(parent(&to)) {
            return self.fail(FileError::NotFound, "target directory missing");
        }

        let mut nodes = self.nodes.borrow_mut();
        let Some(node) = nodes.remove(&from) else {
            drop(nodes);
            return self.fail(FileError::NotFound, "no such file");
        };
        let children: Vec<String> = nodes.keys().filter(|p| is_child_of(p, &from)).cloned().collect();
        for child in children {
            if let Some(moved) = nodes.remove(&child) {
                nodes.insert(format!("{to}{}", &child[from.len()..]), moved);
            }
        }
        nodes.insert(to, node);
        Ok(())
    }

    fn open(&self, path: &str, mode: FileOptions) -> Result<File, FileError> {
        let path = normalize(path)?;
        if mode.0 == 0 {
            return self.fail(FileError::BadMode, "no open mode");
        }

        let mut pos = 0;
        {
            if self.is_dir(&path) {
                return self.fail(FileError::Failed, "is a directory");
            }
            let mut nodes = self.nodes.borrow_mut();
            let existing = match nodes.get(&path) {
                Some(Node::File(data)) => Some(data.len()),
                _ => None,
            };

            if mode.contains(FileOptions::WRITE) {
                nodes.insert(path.clone(), Node::File(Vec::new()));
            } else if mode.contains(FileOptions::APPEND) {
                pos = existing.unwrap_or(0);
                nodes.entry(path.clone()).or_insert_with(|| Node::File(Vec::new()));
            } else if existing.is_none() {
                drop(nodes);
                return self.fail(FileError::NotFound, "no such file");
            }
        }
        if mode.is_writable() && !self.is_dir(parent(&path)) {
            self.nodes.borrow_mut().remove(&path);
            return self.fail(FileError::NotFound, "parent directory missing");
        }

        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        self.open.borrow_mut().insert(id, OpenFile { path, pos, mode });
        File::from_raw(id).ok_or(FileError::Failed)
    }

    fn close(&self, file: File) -> Result<(), FileError> {
        match self.open.borrow_mut().remove(&file.raw()) {
            Some(_) => Ok(()),
            None => self.fail(FileError::Failed, "bad file handle"),
        }
    }

    fn read(&self, file: File, buf: &mut [u8]) -> Result<usize, FileError> {
        let result = self.with_open(file, |handle, nodes| {
            if !handle.mode.contains(FileOptions::READ) && !handle.mode.contains(FileOptions::READ_DATA) {
                return Err(FileError::BadMode);
            }
            let Some(Node::File(data)) = nodes.get(&handle.path) else {
                return Err(FileError::NotFound);
            };
            let start = handle.pos.min(data.len());
            let n = buf.len().min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            handle.pos = start + n;
            Ok(n)
        });
        result.or_else(|e| self.fail(e, "read failed"))
    }

    fn write(&self, file: File, buf: &[u8]) -> Result<usize, FileError> {
        let result = self.with_open(file, |handle, nodes| {
            if !handle.mode.is_writable() {
                return Err(FileError::BadMode);
            }
            let Some(Node::File(data)) = nodes.get_mut(&handle.path) else {
                return Err(FileError::NotFound);
            };
            if handle.mode.contains(FileOptions::APPEND) {
                handle.pos = data.len();
            }
            let end = handle.pos + buf.len();
            if end > data.len() {
                data.resize(end, 0);
            }
            data[handle.pos..end].copy_from_slice(buf);
            handle.pos = end;
            Ok(buf.len())
        });
        result.or_else(|e| self.fail(e, "write failed"))
    }

    fn flush(&self, file: File) -> Result<(), FileError> {
        self.with_open(file, |_, _| Ok(()))
    }

    fn tell(&self, file: File) -> Result<u32, FileError> {
        self.with_open(file, |handle, _| Ok(handle.pos as u32))
    }

    fn seek(&self, file: File, offset: i32, whence: Whence) -> Result<(), FileError> {
        let result = self.with_open(file, |handle, nodes| {
            let len = match nodes.get(&handle.path) {
                Some(Node::File(data)) => data.len() as i64,
                _ => 0,
            };
            let base = match whence {
                Whence::Start => 0,
                Whence::Current => handle.pos as i64,
                Whence::End => len,
            };
            let pos = base + i64::from(offset);
            if pos < 0 {
                return Err(FileError::Failed);
            }
            handle.pos = pos as usize;
            Ok(())
        });
        result.or_else(|e| self.fail(e, "seek failed"))
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &SimFiles, path: &str, hidden: bool) -> Vec<String> {
        let mut out = Vec::new();
        files.list_files(path, hidden, &mut |name| out.push(name.to_string())).unwrap();
        out
    }

    #[test]
    fn test_write_then_read() {
        let files = SimFiles::default();
        let f = files.open("save.dat", FileOptions::WRITE).unwrap();
        assert_eq!(files.write(f, b"hello world").unwrap(), 11);
        assert_eq!(files.tell(f).unwrap(), 11);
        files.close(f).unwrap();

        let f = files.open("/save.dat", FileOptions::READ_DATA).unwrap();
        files.seek(f, 6, Whence::Start).unwrap();
        let mut buf = [0u8; 16];
        let n = files.read(f, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(files.read(f, &mut buf).unwrap(), 0);

        assert_eq!(files.write(f, b"x"), Err(FileError::BadMode));
        assert_eq!(files.last_error(), Some("write failed"));
        files.close(f).unwrap();
        assert_eq!(files.open_count(), 0);
    }

    #[test]
    fn test_append_and_seek_end() {
        let files = SimFiles::default();
        files.insert("log.txt", b"ab");

        let f = files.open("log.txt", FileOptions::APPEND | FileOptions::READ_DATA).unwrap();
        files.seek(f, 0, Whence::Start).unwrap();
        files.write(f, b"cd").unwrap();
        files.seek(f, -3, Whence::End).unwrap();
        let mut buf = [0u8; 3];
        files.read(f, &mut buf).unwrap();
        assert_eq!(&buf, b"bcd");
        assert_eq!(files.seek(f, -10, Whence::Current), Err(FileError::Failed));
        files.close(f).unwrap();

        assert_eq!(files.contents("log.txt").unwrap(), b"abcd");
    }

    #[test]
    fn test_missing_files() {
        let files = SimFiles::default();
        assert_eq!(files.open("nope", FileOptions::READ), Err(FileError::NotFound));
        assert_eq!(files.open("dir/new", FileOptions::WRITE), Err(FileError::NotFound));
        assert_eq!(files.open("bad\0", FileOptions::READ), Err(FileError::InvalidPath));
        assert_eq!(files.open("x", FileOptions::default()), Err(FileError::BadMode));
        assert_eq!(files.stat("nope"), Err(FileError::NotFound));
        assert!(files.contents("dir/new").is_none());
    }

    #[test]
    fn test_directories() {
        let files = SimFiles::default();
        files.mkdir("levels").unwrap();
        assert_eq!(files.mkdir("a/b"), Err(FileError::NotFound));
        files.insert("levels/1.json", b"[]");
        files.insert("levels/.hidden", b"");
        files.insert("levels/extra/2.json", b"{}");

        assert_eq!(names(&files, "levels", false), ["1.json", "extra/"]);
        assert_eq!(names(&files, "levels/", true), [".hidden", "1.json", "extra/"]);
        assert_eq!(names(&files, "", false), ["levels/"]);

        let stat = files.stat("levels/1.json").unwrap();
        assert!(!stat.is_dir);
        assert_eq!(stat.size, 2);
        assert!(files.stat("levels").unwrap().is_dir);

        assert_eq!(files.unlink("levels", false), Err(FileError::Failed));
        files.rename("levels", "stages").unwrap();
        assert_eq!(files.contents("stages/extra/2.json").unwrap(), b"{}");
        assert!(files.stat("levels").is_err());

        files.unlink("stages", true).unwrap();
        assert!(names(&files, "", true).is_empty());
    }
}
