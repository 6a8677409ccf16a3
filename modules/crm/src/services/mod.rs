pub mod crm_service;
