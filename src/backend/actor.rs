use super::messages::{BackendCommand, BackendEvent};
use crate::controller::AcquisitionController;
use crate::service::HttpVideoService;
use crate::utils::config::ServiceConfig;
use crate::utils::error::VidsaverError;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Runs the acquisition controller behind a command/event channel pair
///
/// Each request claims its slot in the loop, in command order, and only the
/// network round trip is spawned. A later command therefore always
/// supersedes an earlier one that is still in flight.
pub struct BackendActor {
    receiver: mpsc::Receiver<BackendCommand>,
    sender: mpsc::Sender<BackendEvent>,
    controller: AcquisitionController,
}

impl BackendActor {
    pub fn new(
        config: ServiceConfig,
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
    ) -> Result<Self> {
        let service = HttpVideoService::new(config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize service client: {}", e))?;
        let controller = AcquisitionController::new(Arc::new(service));

        Ok(Self::with_controller(controller, receiver, sender))
    }

    pub fn with_controller(
        controller: AcquisitionController,
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
    ) -> Self {
        Self {
            receiver,
            sender,
            controller,
        }
    }

    /// Handle on the controller, e.g. to subscribe to session updates
    pub fn controller(&self) -> &AcquisitionController {
        &self.controller
    }

    pub async fn run(mut self) {
        info!("BackendActor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                BackendCommand::FetchInfo { url } => {
                    let pending = match self.controller.begin_metadata(&url).await {
                        Ok(pending) => pending,
                        Err(e) => {
                            notify(&self.sender, e).await;
                            continue;
                        }
                    };
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        match pending.complete().await {
                            Ok(metadata) => {
                                let _ = sender.send(BackendEvent::MetadataReady(metadata)).await;
                            }
                            Err(e) => notify(&sender, e).await,
                        }
                    });
                }
                BackendCommand::SelectFormat(format_id) => {
                    match self.controller.select_format(&format_id).await {
                        Ok(()) => {
                            let _ = self
                                .sender
                                .send(BackendEvent::FormatSelected(format_id.trim().to_string()))
                                .await;
                        }
                        Err(e) => notify(&self.sender, e).await,
                    }
                }
                BackendCommand::Download => {
                    let pending = match self.controller.begin_download().await {
                        Ok(pending) => pending,
                        Err(e) => {
                            notify(&self.sender, e).await;
                            continue;
                        }
                    };
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        match pending.complete().await {
                            Ok(result) => {
                                let _ = sender.send(BackendEvent::DownloadReady(result)).await;
                            }
                            Err(e) => notify(&sender, e).await,
                        }
                    });
                }
                BackendCommand::Reset => {
                    self.controller.reset().await;
                }
                BackendCommand::Shutdown => {
                    info!("BackendActor shutting down");
                    break;
                }
            }
        }
    }
}

/// Turn a failure into exactly one notification; superseded requests stay silent.
async fn notify(sender: &mpsc::Sender<BackendEvent>, error: VidsaverError) {
    if error.is_user_visible() {
        let _ = sender.send(BackendEvent::Notification(error.to_string())).await;
    } else {
        debug!("Suppressed notification: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Phase;
    use crate::service::mock::{self, MockService};
    use std::time::Duration;

    fn spawn_actor(
        service: Arc<MockService>,
    ) -> (
        mpsc::Sender<BackendCommand>,
        mpsc::Receiver<BackendEvent>,
        AcquisitionController,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let actor =
            BackendActor::with_controller(AcquisitionController::new(service), cmd_rx, event_tx);
        let controller = actor.controller().clone();
        tokio::spawn(actor.run());
        (cmd_tx, event_rx, controller)
    }

    #[tokio::test]
    async fn test_fetch_select_download_events() {
        let service = Arc::new(MockService::new());
        service
            .push_info(Ok(mock::metadata(
                "abc",
                vec![mock::format("18", "360p"), mock::format("22", "720p")],
            )))
            .push_download(Ok(mock::filename("abc.mp4")));
        let (commands, mut events, _) = spawn_actor(service.clone());

        commands
            .send(BackendCommand::FetchInfo {
                url: "https://youtube.com/watch?v=abc".into(),
            })
            .await
            .unwrap();
        match events.recv().await.unwrap() {
            BackendEvent::MetadataReady(metadata) => assert_eq!(metadata.formats.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }

        commands
            .send(BackendCommand::SelectFormat("22".into()))
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            BackendEvent::FormatSelected(id) if id == "22"
        ));

        commands.send(BackendCommand::Download).await.unwrap();
        match events.recv().await.unwrap() {
            BackendEvent::DownloadReady(result) => {
                assert_eq!(result.format_id, "22");
                assert!(result.artifact_reference.ends_with("/video/file/abc.mp4"));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        commands.send(BackendCommand::Shutdown).await.unwrap();
    }

    #[tokio::test]
    async fn test_failures_become_single_notification() {
        let service = Arc::new(MockService::new());
        service.push_info(Err(mock::detail_error(400, "Unsupported URL")));
        let (commands, mut events, _) = spawn_actor(service.clone());

        commands
            .send(BackendCommand::FetchInfo {
                url: "https://nope.invalid".into(),
            })
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            BackendEvent::Notification(msg) if msg == "Unsupported URL"
        ));

        commands.send(BackendCommand::Download).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            BackendEvent::Notification(msg) if msg == "No format selected"
        ));
        assert_eq!(service.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_silent() {
        let service = Arc::new(MockService::new());
        service
            .push_info_delayed(
                Ok(mock::metadata("slow", vec![mock::format("18", "360p")])),
                Some(Duration::from_secs(5)),
            )
            .push_info(Ok(mock::metadata("fast", vec![mock::format("22", "720p")])));
        let (commands, mut events, _) = spawn_actor(service.clone());

        commands
            .send(BackendCommand::FetchInfo { url: "https://a".into() })
            .await
            .unwrap();
        for _ in 0..200 {
            if service.info_calls() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        commands
            .send(BackendCommand::FetchInfo { url: "https://b".into() })
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            BackendEvent::MetadataReady(metadata) => assert_eq!(metadata.title, "fast"),
            other => panic!("unexpected event: {:?}", other),
        }
        commands.send(BackendCommand::Shutdown).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_back_to_back_fetches_keep_command_order() {
        for _ in 0..50 {
            let service = Arc::new(MockService::new());
            service
                .push_info_for(
                    "https://a",
                    Ok(mock::metadata("first", vec![mock::format("18", "360p")])),
                    Some(Duration::from_millis(200)),
                )
                .push_info_for(
                    "https://b",
                    Ok(mock::metadata("second", vec![mock::format("22", "720p")])),
                    None,
                );
            let (commands, mut events, controller) = spawn_actor(service.clone());

            commands
                .send(BackendCommand::FetchInfo { url: "https://a".into() })
                .await
                .unwrap();
            commands
                .send(BackendCommand::FetchInfo { url: "https://b".into() })
                .await
                .unwrap();

            match events.recv().await.unwrap() {
                BackendEvent::MetadataReady(metadata) => assert_eq!(metadata.title, "second"),
                other => panic!("unexpected event: {:?}", other),
            }
            let session = controller.snapshot().await;
            assert_eq!(session.url, "https://b");
            assert_eq!(session.selected_format.as_deref(), Some("22"));
            assert!(!session.fetching);

            commands.send(BackendCommand::Shutdown).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_reset_command_clears_session() {
        let service = Arc::new(MockService::new());
        service
            .push_info(Ok(mock::metadata("abc", vec![mock::format("18", "360p")])))
            .push_info_delayed(
                Ok(mock::metadata("slow", vec![mock::format("22", "720p")])),
                Some(Duration::from_secs(5)),
            );
        let (commands, mut events, controller) = spawn_actor(service.clone());

        commands
            .send(BackendCommand::FetchInfo { url: "https://a".into() })
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            BackendEvent::MetadataReady(_)
        ));

        commands
            .send(BackendCommand::FetchInfo { url: "https://b".into() })
            .await
            .unwrap();
        commands.send(BackendCommand::Reset).await.unwrap();
        // Commands are handled in order, so this answer arrives after the reset.
        commands
            .send(BackendCommand::SelectFormat("18".into()))
            .await
            .unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            BackendEvent::Notification(msg) if msg == "No video loaded"
        ));

        let session = controller.snapshot().await;
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.url.is_empty());
        assert!(!session.fetching);

        commands.send(BackendCommand::Shutdown).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(events.try_recv().is_err());
    }
}
