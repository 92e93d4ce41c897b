pub mod mock_provider_server;
