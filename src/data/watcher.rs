// 数据文件热重载
// 开发心理：监听数据文件所在目录，文件被创建或修改时在后台线程重新加载
// 内容不变时不替换，避免无谓地清空排名缓存；加载失败保留旧数据继续服务

use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::core::error::Result;
use crate::data::masterfile::PokemonData;
use crate::ranker::PvpRanker;

/// 重新读取数据文件，内容有变化时替换排名器的数据集
///
/// 返回是否发生了替换。
pub fn reload_if_changed(ranker: &PvpRanker, path: &Path) -> Result<bool> {
    let data = PokemonData::load(path)?;
    if let Some(current) = ranker.pokemon_data() {
        if *current == data {
            debug!("数据文件内容未变化: {:?}", path);
            return Ok(false);
        }
    }
    ranker.replace_pokemon_data(data);
    Ok(true)
}

pub struct MasterFileWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl MasterFileWatcher {
    pub fn start(ranker: Arc<PvpRanker>, path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel::<Event>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            notify::Config::default(),
        )?;
        // 编辑器常以重命名方式写文件，监听目录而不是文件本身
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        let target = path.clone();
        let worker = thread::Builder::new()
            .name("masterfile-watcher".to_string())
            .spawn(move || {
                // 监听器被释放后发送端关闭，循环随之结束
                while let Ok(event) = rx.recv() {
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        continue;
                    }
                    if !event.paths.iter().any(|changed| same_file(changed, &target)) {
                        continue;
                    }
                    match reload_if_changed(&ranker, &target) {
                        Ok(true) => info!("数据文件已热重载: {:?}", target),
                        Ok(false) => {}
                        Err(e) => warn!("数据文件重载失败，继续使用旧数据: {}", e),
                    }
                }
                debug!("数据文件监听线程退出");
            })
            .map_err(notify::Error::io)?;

        info!("开始监听数据文件: {:?}", path);
        Ok(Self {
            path,
            watcher: Some(watcher),
            worker: Some(worker),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn stop(&mut self) {
        if self.watcher.take().is_none() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("数据文件监听线程异常退出");
            }
        }
        info!("停止监听数据文件: {:?}", self.path);
    }
}

impl Drop for MasterFileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn same_file(changed: &Path, target: &Path) -> bool {
    if changed == target {
        return true;
    }
    match (changed.file_name(), target.file_name()) {
        (Some(a), Some(b)) if a == b => {
            let changed_dir = changed.parent().map(Path::canonicalize);
            let target_dir = target.parent().map(Path::canonicalize);
            matches!((changed_dir, target_dir), (Some(Ok(a)), Some(Ok(b))) if a == b)
        }
        _ => false,
    }
}
