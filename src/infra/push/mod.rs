pub mod http_push_service;
