pub mod http_notification_dispatcher;
