use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use crossbeam_channel::Sender;
use tokio::sync::OnceCell;

use super::ContentProcessor;

const REQUEST_QUEUE_SIZE: usize = 64;

struct ProcessRequest {
  input: String,
  from: PathBuf,
  reply: Sender<anyhow::Result<String>>,
}

/// Blocking handle to a [`ContentProcessor`] running on its own thread.
///
/// The worker owns a current-thread Tokio runtime and handles one request at a time, so calls
/// made through the same bridge never overlap.
#[derive(Debug)]
pub struct ProcessorBridge {
  requests: Sender<ProcessRequest>,
}

impl ProcessorBridge {
  pub fn spawn(processor: Arc<dyn ContentProcessor>) -> anyhow::Result<Self> {
    let (requests, receiver) = crossbeam_channel::bounded::<ProcessRequest>(REQUEST_QUEUE_SIZE);

    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()?;

    std::thread::Builder::new()
      .name("inline-css-processor".into())
      .spawn(move || {
        let config = OnceCell::new();

        for ProcessRequest { input, from, reply } in receiver {
          let result = runtime.block_on(async {
            let config = config
              .get_or_try_init(|| processor.load_config())
              .await?;
            processor.process(config, input, &from).await
          });

          // The caller may have given up on the reply
          let _ = reply.send(result);
        }

        tracing::debug!("Stylesheet processor stopped");
      })?;

    Ok(Self { requests })
  }

  /// Send `input` to the worker and block until it answers
  #[tracing::instrument(level = "debug", skip_all, fields(from = %from.display()))]
  pub fn call(&self, input: String, from: &Path) -> anyhow::Result<String> {
    let (reply, response) = crossbeam_channel::bounded(1);

    self
      .requests
      .send(ProcessRequest {
        input,
        from: from.to_path_buf(),
        reply,
      })
      .map_err(|_| anyhow!("Stylesheet processor is not running"))?;

    response
      .recv()
      .map_err(|_| anyhow!("Stylesheet processor stopped before replying"))?
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use pretty_assertions::assert_eq;

  use super::*;
  use crate::processor::testing::UppercaseProcessor;

  #[test]
  fn returns_processed_content() {
    let bridge = ProcessorBridge::spawn(Arc::new(UppercaseProcessor::default())).unwrap();

    assert_eq!(
      bridge
        .call(String::from("a {}"), Path::new("/a.css"))
        .unwrap(),
      "A {}"
    );
  }

  #[test]
  fn loads_config_once() {
    let processor = Arc::new(UppercaseProcessor::default());
    let bridge = ProcessorBridge::spawn(processor.clone()).unwrap();

    for _ in 0..3 {
      bridge
        .call(String::from("a {}"), Path::new("/a.css"))
        .unwrap();
    }

    assert_eq!(processor.config_loads(), 1);
  }

  #[test]
  fn propagates_processor_errors() {
    let bridge = ProcessorBridge::spawn(Arc::new(UppercaseProcessor::default())).unwrap();

    let error = bridge
      .call(String::from("invalid {"), Path::new("/broken.css"))
      .unwrap_err();

    assert_eq!(error.to_string(), "Unexpected token in /broken.css");

    // The worker keeps serving requests after a failure
    assert_eq!(
      bridge
        .call(String::from("b {}"), Path::new("/b.css"))
        .unwrap(),
      "B {}"
    );
  }

  #[test]
  fn serves_callers_on_many_threads() {
    let processor = Arc::new(UppercaseProcessor::default());
    let bridge = Arc::new(ProcessorBridge::spawn(processor.clone()).unwrap());

    let handles: Vec<_> = (0..8)
      .map(|index| {
        let bridge = bridge.clone();
        thread::spawn(move || {
          bridge
            .call(format!(".item-{index} {{}}"), Path::new("/a.css"))
            .unwrap()
        })
      })
      .collect();

    let mut results: Vec<String> = handles
      .into_iter()
      .map(|handle| handle.join().unwrap())
      .collect();
    results.sort();

    assert_eq!(results.len(), 8);
    assert_eq!(results[0], ".ITEM-0 {}");
    assert_eq!(processor.config_loads(), 1);
  }
}
