use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

/// 單次寫檔前最多累積的位元組數
const FLUSH_THRESHOLD: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("spider"));

/// 將日誌訊息丟到背景線程寫入 `log/<name>_<date>.log`
pub struct Logger {
    writer: Option<Sender<LogMessage>>,
}

impl Logger {
    fn new(log_name: &str) -> Self {
        let log_path = match Self::get_log_path(log_name) {
            Some(path) => path,
            None => {
                error_console("Failed to create log directory, file logging is disabled.".to_string());
                return Logger { writer: None };
            }
        };
        let (tx, rx) = unbounded::<LogMessage>();

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
                Ok(file) => file,
                Err(why) => {
                    error_console(format!(
                        "Failed to open log file {}: {:?}",
                        log_path.display(),
                        why
                    ));
                    return;
                }
            };

            let mut writer = BufWriter::new(file);
            let mut line = String::with_capacity(FLUSH_THRESHOLD);

            while let Ok(received) = rx.recv() {
                if writeln!(
                    &mut line,
                    "{} {} {}",
                    received.created_at.format("%F %X%.6f"),
                    received.level,
                    received.msg
                )
                .is_err()
                {
                    continue;
                }

                if rx.is_empty() || line.len() >= FLUSH_THRESHOLD {
                    if writer.write_all(line.as_bytes()).is_err() || writer.flush().is_err() {
                        info_console(line.clone());
                    }

                    line.clear();
                }
            }
        });

        Logger { writer: Some(tx) }
    }

    fn send(&self, level: log::Level, msg: String) {
        match &self.writer {
            Some(writer) => {
                if let Err(why) = writer.send(LogMessage::new(level, msg)) {
                    error_console(why.to_string());
                }
            }
            None => println!(
                "{} {} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
                level,
                msg
            ),
        }
    }

    fn get_log_path(name: &str) -> Option<PathBuf> {
        let path = Path::new("log");

        if !path.exists() {
            fs::create_dir_all(path).ok()?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", name, Local::now().format("%Y-%m-%d")));

        Some(log_path)
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn info_file_async<S: Into<String>>(log: S) {
    LOGGER.send(log::Level::Info, log.into());
}

pub fn warn_file_async<S: Into<String>>(log: S) {
    LOGGER.send(log::Level::Warn, log.into());
}

pub fn error_file_async<S: Into<String>>(log: S) {
    LOGGER.send(log::Level::Error, log.into());
}

pub fn debug_file_async<S: Into<String>>(log: S) {
    LOGGER.send(log::Level::Debug, log.into());
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
