//! Submodule providing the HDFS transport.
//!
//! libhdfs is loaded dynamically on first demand; every `hdfs://`
//! operation fails cleanly when it is unavailable. The loader resolves
//! the full function table once and keeps the library alive for the
//! process lifetime.

#[cfg(unix)]
pub use imp::*;

#[cfg(not(unix))]
pub use stub::*;

#[cfg(not(unix))]
mod stub {
    /// Returns whether libhdfs was loaded; never true on this platform.
    #[must_use]
    pub fn has_hdfs() -> bool {
        false
    }
}

#[cfg(unix)]
mod imp {
    use std::ffi::CString;
    use std::os::raw::{c_char, c_int, c_short, c_void};
    use std::sync::{Arc, OnceLock};

    use log::{error, info};

    use crate::{
        error::StreamError,
        io::{
            file_system::FileSystem,
            path::{is_stdin_stdout_path, FilePath, FileStat, FileType},
            stream::{InputStream, OutputStream, StreamState},
        },
    };

    type HdfsFs = *mut c_void;
    type HdfsFile = *mut c_void;

    const O_RDONLY: c_int = 0;
    const O_WRONLY: c_int = 1;
    const O_APPEND: c_int = 1024;

    const OBJECT_KIND_FILE: c_int = b'F' as c_int;
    const OBJECT_KIND_DIRECTORY: c_int = b'D' as c_int;

    #[repr(C)]
    struct HdfsFileInfo {
        kind: c_int,
        name: *mut c_char,
        last_mod: i64,
        size: i64,
        replication: c_short,
        block_size: i64,
        owner: *mut c_char,
        group: *mut c_char,
        permissions: c_short,
        last_access: i64,
    }

    #[allow(clippy::type_complexity)]
    struct HdfsApi {
        // Keeps the resolved symbols alive.
        _lib: Option<libloading::Library>,
        new_builder: Option<unsafe extern "C" fn() -> *mut c_void>,
        builder_set_force_new_instance: Option<unsafe extern "C" fn(*mut c_void)>,
        builder_conf_set_str:
            Option<unsafe extern "C" fn(*mut c_void, *const c_char, *const c_char) -> c_int>,
        builder_set_name_node: Option<unsafe extern "C" fn(*mut c_void, *const c_char)>,
        builder_set_name_node_port: Option<unsafe extern "C" fn(*mut c_void, u16)>,
        builder_connect: Option<unsafe extern "C" fn(*mut c_void) -> HdfsFs>,
        connect_as_user_new_instance:
            unsafe extern "C" fn(*const c_char, u16, *const c_char) -> HdfsFs,
        connect_new_instance: unsafe extern "C" fn(*const c_char, u16) -> HdfsFs,
        disconnect: unsafe extern "C" fn(HdfsFs) -> c_int,
        free_file_info: unsafe extern "C" fn(*mut HdfsFileInfo, c_int),
        get_path_info: unsafe extern "C" fn(HdfsFs, *const c_char) -> *mut HdfsFileInfo,
        list_directory:
            unsafe extern "C" fn(HdfsFs, *const c_char, *mut c_int) -> *mut HdfsFileInfo,
        glob_status:
            Option<unsafe extern "C" fn(HdfsFs, *const c_char, *mut c_int) -> *mut HdfsFileInfo>,
        rename: unsafe extern "C" fn(HdfsFs, *const c_char, *const c_char) -> c_int,
        create_directory: unsafe extern "C" fn(HdfsFs, *const c_char) -> c_int,
        open_file: unsafe extern "C" fn(HdfsFs, *const c_char, c_int, c_int, c_short, i32) -> HdfsFile,
        close_file: unsafe extern "C" fn(HdfsFs, HdfsFile) -> c_int,
        seek: unsafe extern "C" fn(HdfsFs, HdfsFile, i64) -> c_int,
        tell: unsafe extern "C" fn(HdfsFs, HdfsFile) -> i64,
        read: unsafe extern "C" fn(HdfsFs, HdfsFile, *mut c_void, i32) -> i32,
        write: unsafe extern "C" fn(HdfsFs, HdfsFile, *const c_void, i32) -> i32,
        hflush: unsafe extern "C" fn(HdfsFs, HdfsFile) -> c_int,
    }

    // The function table is only used behind connection handles.
    unsafe impl Send for HdfsApi {}
    unsafe impl Sync for HdfsApi {}

    macro_rules! load_sym {
        ($lib:expr, $name:literal) => {
            match unsafe { $lib.get($name) } {
                Ok(sym) => *sym,
                Err(_) => return None,
            }
        };
    }

    macro_rules! load_optional_sym {
        ($lib:expr, $name:literal) => {
            unsafe { $lib.get($name) }.ok().map(|sym| *sym)
        };
    }

    fn load_api(so: &str) -> Option<HdfsApi> {
        let lib = unsafe { libloading::Library::new(so) }.ok()?;
        let api = HdfsApi {
            _lib: None,
            new_builder: load_optional_sym!(lib, b"hdfsNewBuilder\0"),
            builder_set_force_new_instance: load_optional_sym!(
                lib,
                b"hdfsBuilderSetForceNewInstance\0"
            ),
            builder_conf_set_str: load_optional_sym!(lib, b"hdfsBuilderConfSetStr\0"),
            builder_set_name_node: load_optional_sym!(lib, b"hdfsBuilderSetNameNode\0"),
            builder_set_name_node_port: load_optional_sym!(lib, b"hdfsBuilderSetNameNodePort\0"),
            builder_connect: load_optional_sym!(lib, b"hdfsBuilderConnect\0"),
            connect_as_user_new_instance: load_sym!(lib, b"hdfsConnectAsUserNewInstance\0"),
            connect_new_instance: load_sym!(lib, b"hdfsConnectNewInstance\0"),
            disconnect: load_sym!(lib, b"hdfsDisconnect\0"),
            free_file_info: load_sym!(lib, b"hdfsFreeFileInfo\0"),
            get_path_info: load_sym!(lib, b"hdfsGetPathInfo\0"),
            list_directory: load_sym!(lib, b"hdfsListDirectory\0"),
            glob_status: load_optional_sym!(lib, b"hdfsGlobStatus\0"),
            rename: load_sym!(lib, b"hdfsRename\0"),
            create_directory: load_sym!(lib, b"hdfsCreateDirectory\0"),
            open_file: load_sym!(lib, b"hdfsOpenFile\0"),
            close_file: load_sym!(lib, b"hdfsCloseFile\0"),
            seek: load_sym!(lib, b"hdfsSeek\0"),
            tell: load_sym!(lib, b"hdfsTell\0"),
            read: load_sym!(lib, b"hdfsRead\0"),
            write: load_sym!(lib, b"hdfsWrite\0"),
            hflush: load_sym!(lib, b"hdfsHFlush\0"),
        };
        Some(HdfsApi { _lib: Some(lib), ..api })
    }

    fn api() -> Option<&'static HdfsApi> {
        static API: OnceLock<Option<HdfsApi>> = OnceLock::new();
        API.get_or_init(|| {
            let candidates = ["./libhdfs.so", "./libhdfs.so.1", "libhdfs.so", "libhdfs.so.1"];
            for so in candidates {
                if let Some(api) = load_api(so) {
                    info!("loaded libhdfs functions from {so}");
                    return Some(api);
                }
            }
            info!("libhdfs is unavailable");
            None
        })
        .as_ref()
    }

    /// Returns whether libhdfs was loaded; `hdfs://` paths are usable
    /// only when true.
    #[must_use]
    pub fn has_hdfs() -> bool {
        api().is_some()
    }

    fn errno_message() -> String {
        std::io::Error::last_os_error().to_string()
    }

    // EINTR and EAGAIN
    fn errno_retryable() -> bool {
        matches!(std::io::Error::last_os_error().raw_os_error(), Some(4) | Some(11))
    }

    /// A connection to an HDFS name node.
    ///
    /// `DEEPX_HDFS_UGI` and `DEEPX_HDFS_USER` override the hadoop job
    /// UGI and the HDFS user of every new connection.
    pub struct HdfsHandle {
        fs: HdfsFs,
    }

    // libhdfs connection handles are safe to share between threads.
    unsafe impl Send for HdfsHandle {}
    unsafe impl Sync for HdfsHandle {}

    impl HdfsHandle {
        /// Connects to `host:port`; `("default", 0)` names the default
        /// name node.
        ///
        /// # Errors
        ///
        /// Returns [`StreamError::HdfsUnavailable`] when libhdfs was
        /// not loaded and [`StreamError::HdfsConnect`] when the
        /// connection fails.
        pub fn connect(host: &str, port: u16) -> Result<Arc<Self>, StreamError> {
            let api = api().ok_or(StreamError::HdfsUnavailable)?;
            let ugi = std::env::var("DEEPX_HDFS_UGI").unwrap_or_default();
            let user = std::env::var("DEEPX_HDFS_USER").unwrap_or_default();
            let chost = CString::new(host).map_err(|_| StreamError::HdfsConnect {
                host: host.to_string(),
                port,
            })?;

            let fs = if !ugi.is_empty() {
                let (Some(new_builder), Some(force), Some(conf_set), Some(set_node), Some(set_port), Some(connect)) = (
                    api.new_builder,
                    api.builder_set_force_new_instance,
                    api.builder_conf_set_str,
                    api.builder_set_name_node,
                    api.builder_set_name_node_port,
                    api.builder_connect,
                ) else {
                    error!("hdfs builder functions were not loaded");
                    return Err(StreamError::HdfsConnect { host: host.to_string(), port });
                };
                let key = c"hadoop.job.ugi";
                let cugi = CString::new(ugi).map_err(|_| StreamError::HdfsConnect {
                    host: host.to_string(),
                    port,
                })?;
                // SAFETY: the builder functions were resolved from
                // libhdfs and the strings outlive the calls.
                unsafe {
                    let builder = new_builder();
                    force(builder);
                    set_node(builder, chost.as_ptr());
                    set_port(builder, port);
                    conf_set(builder, key.as_ptr(), cugi.as_ptr());
                    connect(builder)
                }
            } else if !user.is_empty() {
                let cuser = CString::new(user).map_err(|_| StreamError::HdfsConnect {
                    host: host.to_string(),
                    port,
                })?;
                // SAFETY: as above.
                unsafe { (api.connect_as_user_new_instance)(chost.as_ptr(), port, cuser.as_ptr()) }
            } else {
                // SAFETY: as above.
                unsafe { (api.connect_new_instance)(chost.as_ptr(), port) }
            };

            if fs.is_null() {
                error!("failed to connect to hdfs {host}:{port}: {}", errno_message());
                return Err(StreamError::HdfsConnect { host: host.to_string(), port });
            }
            Ok(Arc::new(Self { fs }))
        }

        /// Connects to the default name node.
        ///
        /// # Errors
        ///
        /// See [`Self::connect`].
        pub fn connect_default() -> Result<Arc<Self>, StreamError> {
            Self::connect("default", 0)
        }
    }

    impl Drop for HdfsHandle {
        fn drop(&mut self) {
            if let Some(api) = api() {
                // SAFETY: the handle owns the connection.
                unsafe { (api.disconnect)(self.fs) };
            }
        }
    }

    fn info_to_stat(info: &HdfsFileInfo) -> FileStat {
        let file_type = match info.kind {
            OBJECT_KIND_DIRECTORY => FileType::Dir,
            OBJECT_KIND_FILE => FileType::RegFile,
            _ => FileType::Other,
        };
        FileStat::new(file_type, info.size.max(0) as u64)
    }

    // SAFETY precondition: `info.name` points at a NUL-terminated path.
    unsafe fn info_path(info: &HdfsFileInfo) -> FilePath {
        FilePath::new(
            std::ffi::CStr::from_ptr(info.name).to_string_lossy().into_owned(),
        )
    }

    /// A stream over one HDFS file.
    pub struct HdfsFileStream {
        handle: Arc<HdfsHandle>,
        file: HdfsFile,
        writable: bool,
        bad: bool,
    }

    // The stream owns its file handle; the connection is shared.
    unsafe impl Send for HdfsFileStream {}

    // 128 MiB per hdfsWrite call.
    const MAX_HDFS_WRITE_BYTES: usize = 128 * 1024 * 1024;

    /// Access mode of an HDFS file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum HdfsOpenMode {
        /// Read an existing file.
        In,
        /// Create or overwrite a file.
        Out,
        /// Append to an existing file.
        Append,
    }

    impl HdfsFileStream {
        /// Opens `path` on the connection.
        ///
        /// # Errors
        ///
        /// Returns [`StreamError::HdfsOpen`] when the file cannot be
        /// opened and [`StreamError::StdioUnsupported`] for the path
        /// `-`.
        pub fn open(
            handle: Arc<HdfsHandle>,
            path: &str,
            mode: HdfsOpenMode,
        ) -> Result<Self, StreamError> {
            if is_stdin_stdout_path(path) {
                return Err(StreamError::StdioUnsupported("hdfs"));
            }
            let api = api().ok_or(StreamError::HdfsUnavailable)?;
            let flags = match mode {
                HdfsOpenMode::In => O_RDONLY,
                HdfsOpenMode::Out => O_WRONLY,
                HdfsOpenMode::Append => O_WRONLY | O_APPEND,
            };
            let cpath =
                CString::new(path).map_err(|_| StreamError::HdfsOpen(path.to_string()))?;
            // SAFETY: the connection is alive and the path outlives
            // the call.
            let file = unsafe { (api.open_file)(handle.fs, cpath.as_ptr(), flags, 0, 0, 0) };
            if file.is_null() {
                error!("failed to open hdfs file {path}: {}", errno_message());
                return Err(StreamError::HdfsOpen(path.to_string()));
            }
            Ok(Self { handle, file, writable: mode != HdfsOpenMode::In, bad: false })
        }
    }

    impl Drop for HdfsFileStream {
        fn drop(&mut self) {
            if let Some(api) = api() {
                // SAFETY: the stream owns the file handle.
                unsafe { (api.close_file)(self.handle.fs, self.file) };
            }
        }
    }

    impl StreamState for HdfsFileStream {
        fn is_ok(&self) -> bool {
            !self.bad
        }

        fn set_bad(&mut self) {
            self.bad = true;
        }

        fn clear_bad(&mut self) {
            self.bad = false;
        }
    }

    impl InputStream for HdfsFileStream {
        fn read(&mut self, data: &mut [u8]) -> usize {
            if self.bad {
                return 0;
            }
            let Some(api) = api() else {
                self.bad = true;
                return 0;
            };
            let mut done = 0;
            while done < data.len() {
                let want = (data.len() - done).min(i32::MAX as usize) as i32;
                // SAFETY: the buffer remains valid for the call.
                let bytes = unsafe {
                    (api.read)(
                        self.handle.fs,
                        self.file,
                        data[done..].as_mut_ptr().cast(),
                        want,
                    )
                };
                if bytes > 0 {
                    done += bytes as usize;
                } else if bytes == 0 {
                    self.bad = true;
                    break;
                } else if errno_retryable() {
                    continue;
                } else {
                    error!("failed to read hdfs file: {}", errno_message());
                    self.bad = true;
                    break;
                }
            }
            done
        }

        fn read_byte(&mut self) -> Option<u8> {
            let mut byte = [0u8; 1];
            if self.read(&mut byte) == 1 {
                Some(byte[0])
            } else {
                None
            }
        }

        fn peek(&mut self, data: &mut [u8]) -> usize {
            if self.bad {
                return 0;
            }
            let Some(api) = api() else {
                self.bad = true;
                return 0;
            };
            // SAFETY: the stream owns the file handle.
            let offset = unsafe { (api.tell)(self.handle.fs, self.file) };
            if offset < 0 {
                error!("failed to tell hdfs file: {}", errno_message());
                self.bad = true;
                return 0;
            }
            let bytes = self.read(data);
            // SAFETY: as above.
            if unsafe { (api.seek)(self.handle.fs, self.file, offset) } == -1 {
                error!("failed to seek hdfs file: {}", errno_message());
                self.bad = true;
            }
            bytes
        }
    }

    impl OutputStream for HdfsFileStream {
        fn write(&mut self, data: &[u8]) -> usize {
            if self.bad {
                return 0;
            }
            let Some(api) = api() else {
                self.bad = true;
                return 0;
            };
            let mut done = 0;
            while done < data.len() {
                let want = (data.len() - done).min(MAX_HDFS_WRITE_BYTES) as i32;
                // SAFETY: the buffer remains valid for the call.
                let bytes = unsafe {
                    (api.write)(self.handle.fs, self.file, data[done..].as_ptr().cast(), want)
                };
                if bytes > 0 {
                    done += bytes as usize;
                } else if errno_retryable() {
                    continue;
                } else {
                    error!("failed to write hdfs file: {}", errno_message());
                    self.bad = true;
                    break;
                }
            }
            done
        }

        fn flush(&mut self) -> bool {
            if !self.writable {
                return true;
            }
            let Some(api) = api() else {
                return false;
            };
            // SAFETY: the stream owns the file handle.
            if unsafe { (api.hflush)(self.handle.fs, self.file) } == -1 {
                error!("failed to flush hdfs file: {}", errno_message());
                return false;
            }
            true
        }
    }

    fn is_glob_pattern(pattern: &str) -> bool {
        pattern.contains(['?', '*', '['])
    }

    /// The HDFS backend of the file-system interface.
    pub struct HdfsFileSystem {
        handle: Arc<HdfsHandle>,
    }

    impl HdfsFileSystem {
        /// Creates a file system over an open connection.
        #[must_use]
        pub fn new(handle: Arc<HdfsHandle>) -> Self {
            Self { handle }
        }

        fn stat_impl(&self, path: &FilePath) -> Option<FileStat> {
            let api = api()?;
            let cpath = CString::new(path.as_str()).ok()?;
            // SAFETY: the connection is alive and the path outlives
            // the call.
            let info = unsafe { (api.get_path_info)(self.handle.fs, cpath.as_ptr()) };
            if info.is_null() {
                error!("failed to stat hdfs path {path}: {}", errno_message());
                return None;
            }
            // SAFETY: libhdfs returned one valid record.
            let stat = unsafe { info_to_stat(&*info) };
            unsafe { (api.free_file_info)(info, 1) };
            Some(stat)
        }

        fn collect_infos(
            &self,
            lister: impl FnOnce(HdfsFs, *const c_char, *mut c_int) -> *mut HdfsFileInfo,
            path: &FilePath,
            skip_dir: bool,
            children: &mut Vec<(FilePath, FileStat)>,
        ) -> Option<Vec<FilePath>> {
            let api = api()?;
            let cpath = CString::new(path.as_str()).ok()?;
            let mut n: c_int = 0;
            let infos = lister(self.handle.fs, cpath.as_ptr(), &mut n);
            if infos.is_null() {
                // a null result with no errno is an empty directory
                let err = std::io::Error::last_os_error();
                if err.raw_os_error().unwrap_or(0) != 0 {
                    error!("failed to list hdfs path {path}: {err}");
                    return None;
                }
                return Some(Vec::new());
            }
            let mut dirs = Vec::new();
            for i in 0..n as usize {
                // SAFETY: libhdfs returned n valid records.
                let info = unsafe { &*infos.add(i) };
                let child_path = unsafe { info_path(info) };
                let child_stat = info_to_stat(info);
                if child_stat.is_dir() {
                    dirs.push(child_path.clone());
                    if skip_dir {
                        continue;
                    }
                }
                children.push((child_path, child_stat));
            }
            // SAFETY: as above.
            unsafe { (api.free_file_info)(infos, n) };
            Some(dirs)
        }

        fn list_impl(
            &mut self,
            path: &FilePath,
            skip_dir: bool,
            recursive: bool,
        ) -> Option<Vec<(FilePath, FileStat)>> {
            let api = api()?;
            let mut children = Vec::new();

            if is_glob_pattern(path.as_str()) {
                let glob = api.glob_status.or_else(|| {
                    error!("hdfsGlobStatus was not loaded");
                    None
                })?;
                // SAFETY: symbol resolved from libhdfs.
                self.collect_infos(
                    |fs, p, n| unsafe { glob(fs, p, n) },
                    path,
                    skip_dir,
                    &mut children,
                )?;
                children.sort_by(|a, b| a.0.cmp(&b.0));
                return Some(children);
            }

            let stat = self.stat_impl(path)?;
            if stat.is_file() {
                return Some(vec![(path.clone(), stat)]);
            }

            let mut pending = vec![path.clone()];
            while let Some(dir) = pending.pop() {
                // SAFETY: symbol resolved from libhdfs.
                let dirs = self.collect_infos(
                    |fs, p, n| unsafe { (api.list_directory)(fs, p, n) },
                    &dir,
                    skip_dir,
                    &mut children,
                )?;
                if recursive {
                    pending.extend(dirs);
                }
            }
            children.sort_by(|a, b| a.0.cmp(&b.0));
            Some(children)
        }
    }

    impl FileSystem for HdfsFileSystem {
        fn stat(&mut self, path: &FilePath) -> Option<FileStat> {
            if is_stdin_stdout_path(path.as_str()) {
                error!("invalid hdfs path: {path}");
                return None;
            }
            self.stat_impl(path)
        }

        fn list(&mut self, path: &FilePath, skip_dir: bool) -> Option<Vec<(FilePath, FileStat)>> {
            if is_stdin_stdout_path(path.as_str()) {
                error!("invalid hdfs path: {path}");
                return None;
            }
            self.list_impl(path, skip_dir, false)
        }

        fn list_recursive(
            &mut self,
            path: &FilePath,
            skip_dir: bool,
        ) -> Option<Vec<(FilePath, FileStat)>> {
            if is_stdin_stdout_path(path.as_str()) {
                error!("invalid hdfs path: {path}");
                return None;
            }
            self.list_impl(path, skip_dir, true)
        }

        fn make_dir(&mut self, dir: &FilePath) -> bool {
            if is_stdin_stdout_path(dir.as_str()) {
                error!("invalid hdfs dir: {dir}");
                return false;
            }
            let Some(api) = api() else {
                return false;
            };
            let Ok(cdir) = CString::new(dir.as_str()) else {
                return false;
            };
            // SAFETY: the connection is alive and the path outlives
            // the call.
            if unsafe { (api.create_directory)(self.handle.fs, cdir.as_ptr()) } == -1 {
                error!("failed to make hdfs dir {dir}: {}", errno_message());
                return false;
            }
            true
        }

        fn move_path(&mut self, old_path: &FilePath, new_path: &FilePath) -> bool {
            if is_stdin_stdout_path(old_path.as_str()) || is_stdin_stdout_path(new_path.as_str()) {
                error!("invalid hdfs path: {old_path} -> {new_path}");
                return false;
            }
            let Some(api) = api() else {
                return false;
            };
            let (Ok(cold), Ok(cnew)) =
                (CString::new(old_path.as_str()), CString::new(new_path.as_str()))
            else {
                return false;
            };
            // SAFETY: as above.
            if unsafe { (api.rename)(self.handle.fs, cold.as_ptr(), cnew.as_ptr()) } == -1 {
                error!("failed to move hdfs path {old_path} -> {new_path}: {}", errno_message());
                return false;
            }
            true
        }
    }
}
