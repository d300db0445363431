//! 基于 `std::io` 的通用传输实现
//!
//! 任何实现了 `Read` / `Write` 的字节流（串口句柄、TCP 转串口、管道）都可以
//! 包装成 [`StreamTransport`]。字节级封帧/校验属于固件契约，由调用方通过
//! [`FrameCodec`] 提供。
//!
//! # 线程模型
//!
//! ```text
//! 调用者线程 ── write() ──> [codec.encode] ──> Write
//! RX 线程   <── Read ── [codec.decode] ── ProtocolEvent ──> EventSink
//! ```

use crate::{EventSink, Transport, TransportError};
use bytes::BytesMut;
use parking_lot::Mutex;
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 单次读取的块大小
const READ_CHUNK: usize = 64;

/// 封帧编解码器（固件契约）
///
/// - `encode`: 请求字节 `[code, payload...]` -> 线上字节（加帧头、长度、校验等）
/// - `decode`: 从接收缓冲区中切出一个完整帧并去掉封帧，返回 `[tag, code]`；
///   数据不足时返回 `Ok(None)`，缓冲区中的已消费字节必须被移除
pub trait FrameCodec: Send + Sync {
    fn encode(&self, frame: &[u8]) -> Vec<u8>;

    fn decode(&self, buffer: &mut BytesMut) -> Result<Option<Vec<u8>>, TransportError>;
}

/// 带超时的线程 join
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);

        // 看门狗线程负责 join，超时后由进程退出回收
        std::thread::spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(_) => Err(Box::new(std::io::Error::new(
                ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
        }
    }
}

type BoxedReader = Box<dyn Read + Send>;

/// 基于字节流的传输实现
pub struct StreamTransport<W: Write + Send> {
    /// 写端（调用者线程使用）
    writer: Mutex<W>,
    /// 封帧编解码器（读写共享）
    codec: Arc<dyn FrameCodec>,
    /// 读端，`register` 时移交给 RX 线程
    pending_reader: Mutex<Option<BoxedReader>>,
    /// RX 线程句柄
    reader_thread: Mutex<Option<JoinHandle<()>>>,
    /// 运行标志（RX 线程每次读取前检查）
    is_running: Arc<AtomicBool>,
    /// 是否已关闭
    closed: AtomicBool,
}

impl<W: Write + Send> StreamTransport<W> {
    /// 关闭时等待 RX 线程退出的最长时间
    pub const READER_JOIN_TIMEOUT: Duration = Duration::from_millis(500);

    /// 创建传输
    ///
    /// 读端建议配置读超时（返回 `TimedOut` / `WouldBlock`），
    /// 这样 `close()` 之后 RX 线程可以及时退出。
    pub fn new(
        reader: impl Read + Send + 'static,
        writer: W,
        codec: impl FrameCodec + 'static,
    ) -> Self {
        Self {
            writer: Mutex::new(writer),
            codec: Arc::new(codec),
            pending_reader: Mutex::new(Some(Box::new(reader))),
            reader_thread: Mutex::new(None),
            is_running: Arc::new(AtomicBool::new(true)),
            closed: AtomicBool::new(false),
        }
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// RX 线程是否仍在运行
    pub fn is_reader_alive(&self) -> bool {
        self.reader_thread.lock().as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl<W: Write + Send> Transport for StreamTransport<W> {
    fn write(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let encoded = self.codec.encode(frame);
        let mut writer = self.writer.lock();
        writer.write_all(&encoded)?;
        writer.flush()?;
        trace!("TX {:02X?}", encoded);
        Ok(())
    }

    fn register(&self, sink: EventSink) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let reader = self.pending_reader.lock().take().ok_or(TransportError::AlreadyRegistered)?;
        let codec = self.codec.clone();
        let is_running = self.is_running.clone();

        let handle = std::thread::Builder::new()
            .name("stubby-rx".to_string())
            .spawn(move || reader_loop(reader, codec, sink, is_running))?;
        *self.reader_thread.lock() = Some(handle);

        debug!("Transport reader thread started");
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.is_running.store(false, Ordering::Release);
        let flush_result = self.writer.lock().flush();

        if let Some(handle) = self.reader_thread.lock().take()
            && handle.join_timeout(Self::READER_JOIN_TIMEOUT).is_err()
        {
            warn!(
                "Transport reader did not stop within {:?}",
                Self::READER_JOIN_TIMEOUT
            );
        }

        info!("Transport closed");
        flush_result?;
        Ok(())
    }
}

impl<W: Write + Send> Drop for StreamTransport<W> {
    fn drop(&mut self) {
        // 只通知 RX 线程退出，不代替调用方关闭端口
        self.is_running.store(false, Ordering::Release);
        if !self.is_closed() {
            debug!("StreamTransport dropped without close()");
        }
    }
}

/// RX 循环：读取字节流 -> 解封帧 -> 解码事件 -> 投递
///
/// 在以下情况退出：
/// - `is_running` 被置为 `false`
/// - 读到 EOF 或不可恢复的 IO 错误
/// - 事件接收端已释放
pub fn reader_loop(
    mut reader: impl Read,
    codec: Arc<dyn FrameCodec>,
    sink: EventSink,
    is_running: Arc<AtomicBool>,
) {
    let mut chunk = [0u8; READ_CHUNK];
    let mut buffer = BytesMut::with_capacity(READ_CHUNK * 2);

    while is_running.load(Ordering::Acquire) {
        let n = match reader.read(&mut chunk) {
            Ok(0) => {
                info!("Transport reader reached end of stream");
                break;
            },
            Ok(n) => n,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            },
            Err(e) => {
                error!("Transport read failed: {}", e);
                break;
            },
        };

        buffer.extend_from_slice(&chunk[..n]);

        loop {
            match codec.decode(&mut buffer) {
                Ok(Some(frame)) => match sink.deliver_frame(&frame) {
                    Ok(true) => trace!("RX {:02X?}", frame),
                    Ok(false) => {
                        debug!("Event receiver dropped, reader exiting");
                        return;
                    },
                    Err(e) => warn!("Dropping undecodable frame {:02X?}: {}", frame, e),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("Codec error, discarding {} buffered bytes: {}", buffer.len(), e);
                    buffer.clear();
                    break;
                },
            }
        }
    }
}
