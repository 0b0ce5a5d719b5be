mod session_workflow_tests;
